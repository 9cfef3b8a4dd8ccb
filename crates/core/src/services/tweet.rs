//! Tweet service.

use chrono::Utc;
use sea_orm::Set;
use serde::Serialize;

use playtube_common::{AppError, AppResult, IdGenerator};
use playtube_db::{
    entities::tweet,
    repositories::{TweetRepository, UserRepository},
};

use crate::services::account::UserSummary;

/// Tweet with its owner resolved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetView {
    pub id: String,
    pub content: String,
    /// Owner summary; absent when the owner row is gone.
    pub owner: Option<UserSummary>,
    pub created_at: sea_orm::prelude::DateTimeWithTimeZone,
}

/// Tweet service for business logic.
#[derive(Clone)]
pub struct TweetService {
    tweet_repo: TweetRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl TweetService {
    /// Create a new tweet service.
    #[must_use]
    pub const fn new(tweet_repo: TweetRepository, user_repo: UserRepository) -> Self {
        Self {
            tweet_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a tweet.
    pub async fn create(&self, user_id: &str, content: &str) -> AppResult<tweet::Model> {
        if content.trim().is_empty() {
            return Err(AppError::Validation("Content is required".to_string()));
        }

        let model = tweet::ActiveModel {
            id: Set(self.id_gen.generate()),
            content: Set(content.to_string()),
            owner_id: Set(user_id.to_string()),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        self.tweet_repo.create(model).await
    }

    /// Tweets by a user, newest first, with the owner resolved.
    pub async fn list_by_owner(&self, owner_id: &str) -> AppResult<Vec<TweetView>> {
        let owner = self.user_repo.get_by_id(owner_id).await?;
        let summary = UserSummary::from(&owner);

        let tweets = self.tweet_repo.find_by_owner(owner_id).await?;

        Ok(tweets
            .into_iter()
            .map(|t| TweetView {
                id: t.id,
                content: t.content,
                owner: Some(summary.clone()),
                created_at: t.created_at,
            })
            .collect())
    }

    /// Edit a tweet. Owner only.
    pub async fn update(
        &self,
        user_id: &str,
        tweet_id: &str,
        content: &str,
    ) -> AppResult<tweet::Model> {
        if content.trim().is_empty() {
            return Err(AppError::Validation("Content is required".to_string()));
        }

        let tweet = self.owned_tweet(user_id, tweet_id).await?;

        let model = tweet::ActiveModel {
            id: Set(tweet.id),
            content: Set(content.to_string()),
            updated_at: Set(Some(Utc::now().into())),
            ..Default::default()
        };

        self.tweet_repo.update(model).await
    }

    /// Delete a tweet. Owner only. Likes cascade at the storage layer.
    pub async fn delete(&self, user_id: &str, tweet_id: &str) -> AppResult<()> {
        self.owned_tweet(user_id, tweet_id).await?;
        self.tweet_repo.delete(tweet_id).await?;
        Ok(())
    }

    async fn owned_tweet(&self, user_id: &str, tweet_id: &str) -> AppResult<tweet::Model> {
        let tweet = self.tweet_repo.get_by_id(tweet_id).await?;

        if tweet.owner_id != user_id {
            return Err(AppError::Forbidden(
                "Only the owner can modify this tweet".to_string(),
            ));
        }

        Ok(tweet)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_tweet(id: &str, owner_id: &str) -> tweet::Model {
        tweet::Model {
            id: id.to_string(),
            content: "Hello".to_string(),
            owner_id: owner_id.to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn service_with(tweet_db: MockDatabase) -> TweetService {
        let empty = || Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        TweetService::new(
            TweetRepository::new(Arc::new(tweet_db.into_connection())),
            UserRepository::new(empty()),
        )
    }

    #[tokio::test]
    async fn test_create_rejects_blank_content() {
        let service = service_with(MockDatabase::new(DatabaseBackend::Postgres));

        let result = service.create("u1", "   ").await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_rejects_non_owner() {
        let tweet = create_test_tweet("t1", "owner");
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[tweet]]),
        );

        let result = service.update("intruder", "t1", "Edited").await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
