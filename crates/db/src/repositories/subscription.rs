//! Subscription repository.

use std::sync::Arc;

use crate::entities::{subscription, Subscription};
use playtube_common::{AppError, AppResult, IdGenerator};
use sea_orm::{
    sea_query::OnConflict, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TryInsertResult,
};

/// Subscription repository for database operations.
#[derive(Clone)]
pub struct SubscriptionRepository {
    db: Arc<DatabaseConnection>,
    id_gen: IdGenerator,
}

impl SubscriptionRepository {
    /// Create a new subscription repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            id_gen: IdGenerator::new(),
        }
    }

    /// Insert a subscription unless the (subscriber, channel) pair exists.
    ///
    /// Backed by the unique pair index and `ON CONFLICT DO NOTHING`, so
    /// concurrent duplicate toggles converge to a single row. Returns
    /// whether a row was inserted.
    pub async fn insert_if_absent(&self, subscriber_id: &str, channel_id: &str) -> AppResult<bool> {
        let model = subscription::ActiveModel {
            id: Set(self.id_gen.generate()),
            subscriber_id: Set(subscriber_id.to_string()),
            channel_id: Set(channel_id.to_string()),
            created_at: Set(chrono::Utc::now().into()),
        };

        let result = Subscription::insert(model)
            .on_conflict(
                OnConflict::columns([
                    subscription::Column::SubscriberId,
                    subscription::Column::ChannelId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .do_nothing()
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(matches!(result, TryInsertResult::Inserted(_)))
    }

    /// Delete the subscription for a (subscriber, channel) pair.
    pub async fn delete_by_pair(&self, subscriber_id: &str, channel_id: &str) -> AppResult<u64> {
        let result = Subscription::delete_many()
            .filter(subscription::Column::SubscriberId.eq(subscriber_id))
            .filter(subscription::Column::ChannelId.eq(channel_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Check whether a user is subscribed to a channel.
    pub async fn is_subscribed(&self, subscriber_id: &str, channel_id: &str) -> AppResult<bool> {
        let found = Subscription::find()
            .filter(subscription::Column::SubscriberId.eq(subscriber_id))
            .filter(subscription::Column::ChannelId.eq(channel_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(found.is_some())
    }

    /// Subscriptions to a channel, newest first.
    pub async fn find_by_channel(&self, channel_id: &str) -> AppResult<Vec<subscription::Model>> {
        Subscription::find()
            .filter(subscription::Column::ChannelId.eq(channel_id))
            .order_by_desc(subscription::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Subscriptions made by a user, newest first.
    pub async fn find_by_subscriber(
        &self,
        subscriber_id: &str,
    ) -> AppResult<Vec<subscription::Model>> {
        Subscription::find()
            .filter(subscription::Column::SubscriberId.eq(subscriber_id))
            .order_by_desc(subscription::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count subscribers of a channel.
    pub async fn count_subscribers(&self, channel_id: &str) -> AppResult<u64> {
        Subscription::find()
            .filter(subscription::Column::ChannelId.eq(channel_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count channels a user is subscribed to.
    pub async fn count_subscribed_channels(&self, subscriber_id: &str) -> AppResult<u64> {
        Subscription::find()
            .filter(subscription::Column::SubscriberId.eq(subscriber_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
