//! Subscription service.

use std::collections::HashMap;

use playtube_common::{AppError, AppResult};
use playtube_db::repositories::{SubscriptionRepository, UserRepository};

use crate::services::account::UserSummary;
use crate::services::like::ToggleResult;

/// Subscription service for business logic.
#[derive(Clone)]
pub struct SubscriptionService {
    subscription_repo: SubscriptionRepository,
    user_repo: UserRepository,
}

impl SubscriptionService {
    /// Create a new subscription service.
    #[must_use]
    pub const fn new(subscription_repo: SubscriptionRepository, user_repo: UserRepository) -> Self {
        Self {
            subscription_repo,
            user_repo,
        }
    }

    /// Toggle a subscription to a channel.
    ///
    /// Insert-if-absent, else delete, backed by the unique pair index. The
    /// caller learns from the result which way the toggle went.
    pub async fn toggle(&self, subscriber_id: &str, channel_id: &str) -> AppResult<ToggleResult> {
        if subscriber_id == channel_id {
            return Err(AppError::BadRequest(
                "Cannot subscribe to yourself".to_string(),
            ));
        }

        // Subscribing to a missing channel is a 404.
        self.user_repo.get_by_id(channel_id).await?;

        if self
            .subscription_repo
            .insert_if_absent(subscriber_id, channel_id)
            .await?
        {
            return Ok(ToggleResult::Added);
        }

        let removed = self
            .subscription_repo
            .delete_by_pair(subscriber_id, channel_id)
            .await?;
        if removed == 0 {
            return Err(AppError::Conflict(
                "Subscription toggled concurrently, retry".to_string(),
            ));
        }

        Ok(ToggleResult::Removed)
    }

    /// Users subscribed to a channel.
    pub async fn subscribers(&self, channel_id: &str) -> AppResult<Vec<UserSummary>> {
        self.user_repo.get_by_id(channel_id).await?;

        let subscriptions = self.subscription_repo.find_by_channel(channel_id).await?;
        let ids: Vec<String> = subscriptions
            .iter()
            .map(|s| s.subscriber_id.clone())
            .collect();

        self.resolve(&ids).await
    }

    /// Channels a user subscribes to.
    pub async fn subscribed_channels(&self, subscriber_id: &str) -> AppResult<Vec<UserSummary>> {
        self.user_repo.get_by_id(subscriber_id).await?;

        let subscriptions = self
            .subscription_repo
            .find_by_subscriber(subscriber_id)
            .await?;
        let ids: Vec<String> = subscriptions.iter().map(|s| s.channel_id.clone()).collect();

        self.resolve(&ids).await
    }

    async fn resolve(&self, ids: &[String]) -> AppResult<Vec<UserSummary>> {
        let users = self.user_repo.find_by_ids(ids).await?;
        let by_id: HashMap<_, _> = users
            .iter()
            .map(|u| (u.id.clone(), UserSummary::from(u)))
            .collect();

        Ok(ids.iter().filter_map(|id| by_id.get(id).cloned()).collect())
    }
}
