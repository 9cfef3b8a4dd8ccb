//! Tweet repository.

use std::sync::Arc;

use crate::entities::{tweet, Tweet};
use playtube_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

/// Tweet repository for database operations.
#[derive(Clone)]
pub struct TweetRepository {
    db: Arc<DatabaseConnection>,
}

impl TweetRepository {
    /// Create a new tweet repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a tweet by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<tweet::Model>> {
        Tweet::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a tweet by ID, failing when absent.
    pub async fn get_by_id(&self, id: &str) -> AppResult<tweet::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tweet {id}")))
    }

    /// Create a new tweet.
    pub async fn create(&self, model: tweet::ActiveModel) -> AppResult<tweet::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a tweet from an active model.
    pub async fn update(&self, model: tweet::ActiveModel) -> AppResult<tweet::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a tweet.
    pub async fn delete(&self, id: &str) -> AppResult<u64> {
        let result = Tweet::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Tweets by a user, newest first.
    pub async fn find_by_owner(&self, owner_id: &str) -> AppResult<Vec<tweet::Model>> {
        Tweet::find()
            .filter(tweet::Column::OwnerId.eq(owner_id))
            .order_by_desc(tweet::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_tweet(id: &str, owner_id: &str, content: &str) -> tweet::Model {
        tweet::Model {
            id: id.to_string(),
            content: content.to_string(),
            owner_id: owner_id.to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_owner() {
        let t1 = create_test_tweet("t1", "u1", "hello");
        let t2 = create_test_tweet("t2", "u1", "world");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[t1, t2]])
                .into_connection(),
        );

        let repo = TweetRepository::new(db);
        let result = repo.find_by_owner("u1").await.unwrap();

        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<tweet::Model>::new()])
                .into_connection(),
        );

        let repo = TweetRepository::new(db);
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
