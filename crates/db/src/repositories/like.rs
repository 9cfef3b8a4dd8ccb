//! Like repository.

use std::sync::Arc;

use crate::entities::{like, video, Like};
use playtube_common::{AppError, AppResult, IdGenerator};
use sea_orm::{
    sea_query::OnConflict, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TryInsertResult,
};

/// Target of a like: exactly one of video, comment, tweet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeTarget<'a> {
    /// A video.
    Video(&'a str),
    /// A comment.
    Comment(&'a str),
    /// A tweet.
    Tweet(&'a str),
}

impl LikeTarget<'_> {
    const fn column(&self) -> like::Column {
        match self {
            Self::Video(_) => like::Column::VideoId,
            Self::Comment(_) => like::Column::CommentId,
            Self::Tweet(_) => like::Column::TweetId,
        }
    }

    const fn id(&self) -> &str {
        match self {
            Self::Video(id) | Self::Comment(id) | Self::Tweet(id) => id,
        }
    }
}

/// Like repository for database operations.
#[derive(Clone)]
pub struct LikeRepository {
    db: Arc<DatabaseConnection>,
    id_gen: IdGenerator,
}

impl LikeRepository {
    /// Create a new like repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            id_gen: IdGenerator::new(),
        }
    }

    /// Insert a like unless the (user, target) pair already exists.
    ///
    /// Backed by the unique pair index and `ON CONFLICT DO NOTHING`, so two
    /// concurrent toggles cannot create duplicates. Returns whether a row
    /// was inserted.
    pub async fn insert_if_absent(&self, user_id: &str, target: LikeTarget<'_>) -> AppResult<bool> {
        let mut model = like::ActiveModel {
            id: Set(self.id_gen.generate()),
            liked_by: Set(user_id.to_string()),
            video_id: Set(None),
            comment_id: Set(None),
            tweet_id: Set(None),
            created_at: Set(chrono::Utc::now().into()),
        };

        match target {
            LikeTarget::Video(id) => model.video_id = Set(Some(id.to_string())),
            LikeTarget::Comment(id) => model.comment_id = Set(Some(id.to_string())),
            LikeTarget::Tweet(id) => model.tweet_id = Set(Some(id.to_string())),
        }

        let result = Like::insert(model)
            .on_conflict(
                OnConflict::columns([like::Column::LikedBy, target.column()])
                    .do_nothing()
                    .to_owned(),
            )
            .do_nothing()
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(matches!(result, TryInsertResult::Inserted(_)))
    }

    /// Delete the like for a (user, target) pair. Returns affected rows.
    pub async fn delete_by_pair(&self, user_id: &str, target: LikeTarget<'_>) -> AppResult<u64> {
        let result = Like::delete_many()
            .filter(like::Column::LikedBy.eq(user_id))
            .filter(target.column().eq(target.id()))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Check whether a user has liked a target.
    pub async fn exists(&self, user_id: &str, target: LikeTarget<'_>) -> AppResult<bool> {
        let found = Like::find()
            .filter(like::Column::LikedBy.eq(user_id))
            .filter(target.column().eq(target.id()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(found.is_some())
    }

    /// Count likes on a target.
    pub async fn count_for(&self, target: LikeTarget<'_>) -> AppResult<u64> {
        Like::find()
            .filter(target.column().eq(target.id()))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All likes on the given comments (for batched count/is-liked reads).
    pub async fn find_for_comments(&self, comment_ids: &[String]) -> AppResult<Vec<like::Model>> {
        if comment_ids.is_empty() {
            return Ok(Vec::new());
        }

        Like::find()
            .filter(like::Column::CommentId.is_in(comment_ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Video likes by a user, newest first (the liked-videos feed).
    pub async fn find_video_likes_by_user(&self, user_id: &str) -> AppResult<Vec<like::Model>> {
        Like::find()
            .filter(like::Column::LikedBy.eq(user_id))
            .filter(like::Column::VideoId.is_not_null())
            .order_by_desc(like::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count likes across all videos owned by a user (dashboard stat).
    pub async fn count_video_likes_for_owner(&self, owner_id: &str) -> AppResult<u64> {
        Like::find()
            .join(JoinType::InnerJoin, like::Relation::Video.def())
            .filter(video::Column::OwnerId.eq(owner_id))
            .count(self.db.as_ref())
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

    fn create_test_like(id: &str, user_id: &str, video_id: &str) -> like::Model {
        like::Model {
            id: id.to_string(),
            video_id: Some(video_id.to_string()),
            comment_id: None,
            tweet_id: None,
            liked_by: user_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_exists_true() {
        let like = create_test_like("l1", "u1", "v1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[like.clone()]])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        let result = repo.exists("u1", LikeTarget::Video("v1")).await.unwrap();

        assert!(result);
    }

    #[tokio::test]
    async fn test_exists_false() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<like::Model>::new()])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        let result = repo.exists("u1", LikeTarget::Tweet("t1")).await.unwrap();

        assert!(!result);
    }

    #[tokio::test]
    async fn test_find_for_comments_empty_is_no_query() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = LikeRepository::new(db);
        let result = repo.find_for_comments(&[]).await.unwrap();

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_find_video_likes_by_user() {
        let l1 = create_test_like("l1", "u1", "v1");
        let l2 = create_test_like("l2", "u1", "v2");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[l1, l2]])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        let result = repo.find_video_likes_by_user("u1").await.unwrap();

        assert_eq!(result.len(), 2);
    }
}
