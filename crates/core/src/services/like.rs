//! Like service.

use std::collections::HashMap;

use playtube_common::{AppError, AppResult};
use playtube_db::repositories::{
    CommentRepository, LikeRepository, LikeTarget, TweetRepository, UserRepository,
    VideoRepository,
};
use serde::Serialize;

use crate::services::account::UserSummary;
use crate::services::video::VideoView;

/// Result of a toggle operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ToggleResult {
    /// The like (or subscription) now exists.
    Added,
    /// It existed and was removed.
    Removed,
}

/// Like service for business logic.
#[derive(Clone)]
pub struct LikeService {
    like_repo: LikeRepository,
    video_repo: VideoRepository,
    comment_repo: CommentRepository,
    tweet_repo: TweetRepository,
    user_repo: UserRepository,
}

impl LikeService {
    /// Create a new like service.
    #[must_use]
    pub const fn new(
        like_repo: LikeRepository,
        video_repo: VideoRepository,
        comment_repo: CommentRepository,
        tweet_repo: TweetRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            like_repo,
            video_repo,
            comment_repo,
            tweet_repo,
            user_repo,
        }
    }

    /// Toggle a like on a video.
    pub async fn toggle_video_like(&self, user_id: &str, video_id: &str) -> AppResult<ToggleResult> {
        self.video_repo.get_by_id(video_id).await?;
        self.toggle(user_id, LikeTarget::Video(video_id)).await
    }

    /// Toggle a like on a comment.
    pub async fn toggle_comment_like(
        &self,
        user_id: &str,
        comment_id: &str,
    ) -> AppResult<ToggleResult> {
        self.comment_repo.get_by_id(comment_id).await?;
        self.toggle(user_id, LikeTarget::Comment(comment_id)).await
    }

    /// Toggle a like on a tweet.
    pub async fn toggle_tweet_like(&self, user_id: &str, tweet_id: &str) -> AppResult<ToggleResult> {
        self.tweet_repo.get_by_id(tweet_id).await?;
        self.toggle(user_id, LikeTarget::Tweet(tweet_id)).await
    }

    /// Videos the user has liked, newest like first, with owners resolved.
    pub async fn liked_videos(&self, user_id: &str) -> AppResult<Vec<VideoView>> {
        let likes = self.like_repo.find_video_likes_by_user(user_id).await?;

        let video_ids: Vec<String> = likes
            .iter()
            .filter_map(|l| l.video_id.clone())
            .collect();
        let videos = self.video_repo.find_by_ids(&video_ids).await?;

        let owner_ids: Vec<String> = videos.iter().map(|v| v.owner_id.clone()).collect();
        let owners = self.user_repo.find_by_ids(&owner_ids).await?;
        let owners_by_id: HashMap<_, _> = owners
            .iter()
            .map(|u| (u.id.clone(), UserSummary::from(u)))
            .collect();

        let videos_by_id: HashMap<_, _> =
            videos.into_iter().map(|v| (v.id.clone(), v)).collect();

        // Preserve like order; skip likes whose video is gone.
        Ok(video_ids
            .iter()
            .filter_map(|id| videos_by_id.get(id))
            .map(|v| VideoView::from_model(v.clone(), owners_by_id.get(&v.owner_id).cloned()))
            .collect())
    }

    /// Insert-if-absent, else delete. The unique pair index plus
    /// `ON CONFLICT DO NOTHING` make two concurrent identical toggles
    /// converge to at most one row.
    async fn toggle(&self, user_id: &str, target: LikeTarget<'_>) -> AppResult<ToggleResult> {
        if self.like_repo.insert_if_absent(user_id, target).await? {
            return Ok(ToggleResult::Added);
        }

        let removed = self.like_repo.delete_by_pair(user_id, target).await?;
        if removed == 0 {
            // The row vanished between the conflicting insert and the delete.
            return Err(AppError::Conflict(
                "Like toggled concurrently, retry".to_string(),
            ));
        }

        Ok(ToggleResult::Removed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use playtube_db::entities::video;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_video(id: &str) -> video::Model {
        video::Model {
            id: id.to_string(),
            owner_id: "owner".to_string(),
            video_url: "/media/v.mp4".to_string(),
            thumbnail_url: "/media/t.png".to_string(),
            title: "Intro".to_string(),
            description: "desc".to_string(),
            duration: 42.0,
            views: 0,
            is_published: true,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn service_with(like_db: MockDatabase, video_db: MockDatabase) -> LikeService {
        let empty = || Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        LikeService::new(
            LikeRepository::new(Arc::new(like_db.into_connection())),
            VideoRepository::new(Arc::new(video_db.into_connection())),
            CommentRepository::new(empty()),
            TweetRepository::new(empty()),
            UserRepository::new(empty()),
        )
    }

    #[tokio::test]
    async fn test_toggle_on_missing_video() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<video::Model>::new()]),
        );

        let result = service.toggle_video_like("u1", "missing").await;

        assert!(matches!(result, Err(AppError::VideoNotFound(_))));
    }

    #[tokio::test]
    async fn test_toggle_inserts_when_absent() {
        let like_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }]);
        let video_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_video("v1")]]);

        let service = service_with(like_db, video_db);
        let result = service.toggle_video_like("u1", "v1").await.unwrap();

        assert_eq!(result, ToggleResult::Added);
    }

    #[tokio::test]
    async fn test_toggle_removes_on_conflict() {
        // Insert reports a conflict (no rows affected), then the delete hits.
        let like_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ]);
        let video_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_video("v1")]]);

        let service = service_with(like_db, video_db);
        let result = service.toggle_video_like("u1", "v1").await.unwrap();

        assert_eq!(result, ToggleResult::Removed);
    }
}
