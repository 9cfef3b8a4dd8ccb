//! Video service: publishing, listing, playback reads.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::Set;
use serde::Serialize;

use playtube_common::{storage::MediaStorage, AppError, AppResult, IdGenerator};
use playtube_db::{
    entities::video,
    repositories::{
        LikeRepository, LikeTarget, UserRepository, VideoRepository, VideoSort,
        WatchHistoryRepository,
    },
};

use crate::services::account::UserSummary;

/// Parameters for a video listing.
#[derive(Debug, Clone, Default)]
pub struct ListVideosParams {
    /// 1-based page number.
    pub page: u64,
    /// Page size.
    pub limit: u64,
    /// Restrict to a single owner.
    pub owner_id: Option<String>,
    /// Free-text search over title and description.
    pub search: Option<String>,
    /// Sort key.
    pub sort: VideoSort,
    /// Sort ascending instead of the default descending.
    pub ascending: bool,
}

/// Public view of a video with its owner resolved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoView {
    pub id: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    /// Owner summary; absent when the owner row is gone.
    pub owner: Option<UserSummary>,
    pub created_at: sea_orm::prelude::DateTimeWithTimeZone,
}

impl VideoView {
    /// Build a view from a model and its resolved owner.
    #[must_use]
    pub fn from_model(model: video::Model, owner: Option<UserSummary>) -> Self {
        Self {
            id: model.id,
            video_url: model.video_url,
            thumbnail_url: model.thumbnail_url,
            title: model.title,
            description: model.description,
            duration: model.duration,
            views: model.views,
            is_published: model.is_published,
            owner,
            created_at: model.created_at,
        }
    }
}

/// A single video with its like aggregates.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetail {
    #[serde(flatten)]
    pub video: VideoView,
    /// Total likes on the video.
    pub likes_count: u64,
    /// Whether the requesting user has liked it.
    pub is_liked: bool,
}

/// One page of a video listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoPage {
    pub videos: Vec<VideoView>,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

/// Video service for business logic.
#[derive(Clone)]
pub struct VideoService {
    video_repo: VideoRepository,
    user_repo: UserRepository,
    like_repo: LikeRepository,
    watch_repo: WatchHistoryRepository,
    storage: Arc<dyn MediaStorage>,
    id_gen: IdGenerator,
}

impl VideoService {
    /// Create a new video service.
    #[must_use]
    pub fn new(
        video_repo: VideoRepository,
        user_repo: UserRepository,
        like_repo: LikeRepository,
        watch_repo: WatchHistoryRepository,
        storage: Arc<dyn MediaStorage>,
    ) -> Self {
        Self {
            video_repo,
            user_repo,
            like_repo,
            watch_repo,
            storage,
            id_gen: IdGenerator::new(),
        }
    }

    /// List videos, paginated, with owners resolved.
    pub async fn list(&self, params: ListVideosParams) -> AppResult<VideoPage> {
        let page = params.page.max(1);
        let limit = params.limit.clamp(1, 100);

        let (videos, total_pages) = self
            .video_repo
            .list(
                params.owner_id.as_deref(),
                params.search.as_deref(),
                true,
                params.sort,
                params.ascending,
                page,
                limit,
            )
            .await?;

        let views = self.resolve_owners(videos).await?;

        Ok(VideoPage {
            videos: views,
            page,
            limit,
            total_pages,
        })
    }

    /// Publish a new video from uploaded media.
    ///
    /// The playback duration comes from the upload backend; backends that
    /// cannot probe media report zero.
    pub async fn publish(
        &self,
        owner_id: &str,
        title: &str,
        description: &str,
        video_file: (Vec<u8>, String),
        thumbnail: (Vec<u8>, String),
    ) -> AppResult<VideoView> {
        if title.trim().is_empty() {
            return Err(AppError::Validation("Title is required".to_string()));
        }

        let (video_data, video_type) = video_file;
        let video_key = self.media_key("videos", &video_type);
        let uploaded_video = self
            .storage
            .upload(&video_key, &video_data, &video_type)
            .await?;

        let (thumb_data, thumb_type) = thumbnail;
        let thumb_key = self.media_key("thumbnails", &thumb_type);
        let uploaded_thumb = self
            .storage
            .upload(&thumb_key, &thumb_data, &thumb_type)
            .await?;

        let model = video::ActiveModel {
            id: Set(self.id_gen.generate()),
            owner_id: Set(owner_id.to_string()),
            video_url: Set(uploaded_video.url),
            thumbnail_url: Set(uploaded_thumb.url),
            title: Set(title.to_string()),
            description: Set(description.to_string()),
            duration: Set(uploaded_video.duration.unwrap_or(0.0)),
            views: Set(0),
            is_published: Set(true),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let created = self.video_repo.create(model).await?;
        tracing::info!(video_id = %created.id, owner_id = %owner_id, "Published video");

        let owner = self.user_repo.find_by_id(owner_id).await?;
        Ok(VideoView::from_model(
            created,
            owner.as_ref().map(UserSummary::from),
        ))
    }

    /// Fetch a single video with like aggregates.
    ///
    /// Viewing also increments the view counter and records watch history for
    /// authenticated viewers. Both are side effects of the read: failures are
    /// logged at `warn` and never surface to the caller. The returned view
    /// count is the value before this view.
    pub async fn get_by_id(&self, video_id: &str, viewer_id: Option<&str>) -> AppResult<VideoDetail> {
        let video = self.video_repo.get_by_id(video_id).await?;

        let owner = self.user_repo.find_by_id(&video.owner_id).await?;
        let likes_count = self.like_repo.count_for(LikeTarget::Video(video_id)).await?;
        let is_liked = match viewer_id {
            Some(viewer_id) => {
                self.like_repo
                    .exists(viewer_id, LikeTarget::Video(video_id))
                    .await?
            }
            None => false,
        };

        if let Err(e) = self.video_repo.increment_views(video_id).await {
            tracing::warn!(error = %e, video_id = %video_id, "Failed to increment view count");
        }

        if let Some(viewer_id) = viewer_id
            && let Err(e) = self.watch_repo.record(viewer_id, video_id).await
        {
            tracing::warn!(error = %e, video_id = %video_id, "Failed to record watch history");
        }

        Ok(VideoDetail {
            video: VideoView::from_model(video, owner.as_ref().map(UserSummary::from)),
            likes_count,
            is_liked,
        })
    }

    /// Update title and description. Owner only.
    pub async fn update_details(
        &self,
        user_id: &str,
        video_id: &str,
        title: &str,
        description: &str,
    ) -> AppResult<VideoView> {
        if title.trim().is_empty() {
            return Err(AppError::Validation("Title is required".to_string()));
        }

        let video = self.owned_video(user_id, video_id).await?;

        let model = video::ActiveModel {
            id: Set(video.id),
            title: Set(title.to_string()),
            description: Set(description.to_string()),
            updated_at: Set(Some(Utc::now().into())),
            ..Default::default()
        };

        let updated = self.video_repo.update(model).await?;
        let owner = self.user_repo.find_by_id(user_id).await?;
        Ok(VideoView::from_model(
            updated,
            owner.as_ref().map(UserSummary::from),
        ))
    }

    /// Replace the thumbnail. Owner only.
    pub async fn update_thumbnail(
        &self,
        user_id: &str,
        video_id: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> AppResult<VideoView> {
        let video = self.owned_video(user_id, video_id).await?;

        let key = self.media_key("thumbnails", content_type);
        let uploaded = self.storage.upload(&key, &data, content_type).await?;

        let model = video::ActiveModel {
            id: Set(video.id),
            thumbnail_url: Set(uploaded.url),
            updated_at: Set(Some(Utc::now().into())),
            ..Default::default()
        };

        let updated = self.video_repo.update(model).await?;
        let owner = self.user_repo.find_by_id(user_id).await?;
        Ok(VideoView::from_model(
            updated,
            owner.as_ref().map(UserSummary::from),
        ))
    }

    /// Delete a video. Owner only. Comments, likes, playlist entries and
    /// watch history rows are removed by the storage engine's cascades.
    pub async fn delete(&self, user_id: &str, video_id: &str) -> AppResult<()> {
        self.owned_video(user_id, video_id).await?;
        self.video_repo.delete(video_id).await?;

        tracing::info!(video_id = %video_id, "Deleted video");
        Ok(())
    }

    /// Flip the publish flag. Owner only.
    pub async fn toggle_publish(&self, user_id: &str, video_id: &str) -> AppResult<VideoView> {
        let video = self.owned_video(user_id, video_id).await?;

        let model = video::ActiveModel {
            id: Set(video.id.clone()),
            is_published: Set(!video.is_published),
            updated_at: Set(Some(Utc::now().into())),
            ..Default::default()
        };

        let updated = self.video_repo.update(model).await?;
        let owner = self.user_repo.find_by_id(user_id).await?;
        Ok(VideoView::from_model(
            updated,
            owner.as_ref().map(UserSummary::from),
        ))
    }

    /// Resolve owners for a batch of videos.
    pub(crate) async fn resolve_owners(
        &self,
        videos: Vec<video::Model>,
    ) -> AppResult<Vec<VideoView>> {
        let owner_ids: Vec<String> = videos.iter().map(|v| v.owner_id.clone()).collect();
        let owners = self.user_repo.find_by_ids(&owner_ids).await?;

        let owners_by_id: HashMap<_, _> = owners
            .iter()
            .map(|u| (u.id.clone(), UserSummary::from(u)))
            .collect();

        Ok(videos
            .into_iter()
            .map(|v| {
                let owner = owners_by_id.get(&v.owner_id).cloned();
                VideoView::from_model(v, owner)
            })
            .collect())
    }

    async fn owned_video(&self, user_id: &str, video_id: &str) -> AppResult<video::Model> {
        let video = self.video_repo.get_by_id(video_id).await?;

        if video.owner_id != user_id {
            return Err(AppError::Forbidden(
                "Only the owner can modify this video".to_string(),
            ));
        }

        Ok(video)
    }

    fn media_key(&self, prefix: &str, content_type: &str) -> String {
        let ext = content_type.rsplit('/').next().unwrap_or("bin");
        format!("{prefix}/{}.{ext}", self.id_gen.generate())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use playtube_common::storage::LocalStorage;
    use playtube_db::entities::{like, user, watch_history};
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult};
    use std::path::PathBuf;

    fn create_test_video(id: &str, owner_id: &str, published: bool) -> video::Model {
        video::Model {
            id: id.to_string(),
            owner_id: owner_id.to_string(),
            video_url: "/media/v.mp4".to_string(),
            thumbnail_url: "/media/t.png".to_string(),
            title: "Intro".to_string(),
            description: "desc".to_string(),
            duration: 42.0,
            views: 7,
            is_published: published,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_owner(id: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            full_name: "Alice".to_string(),
            password_hash: "$argon2id$test".to_string(),
            avatar_url: "/media/avatar.png".to_string(),
            cover_image_url: None,
            refresh_token: None,
            is_verified: false,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn service_with(video_db: MockDatabase) -> VideoService {
        let empty = MockDatabase::new(DatabaseBackend::Postgres);
        let empty2 = MockDatabase::new(DatabaseBackend::Postgres);
        let empty3 = MockDatabase::new(DatabaseBackend::Postgres);
        service_with_all(video_db, empty, empty2, empty3)
    }

    fn service_with_all(
        video_db: MockDatabase,
        user_db: MockDatabase,
        like_db: MockDatabase,
        watch_db: MockDatabase,
    ) -> VideoService {
        VideoService::new(
            VideoRepository::new(std::sync::Arc::new(video_db.into_connection())),
            UserRepository::new(std::sync::Arc::new(user_db.into_connection())),
            LikeRepository::new(std::sync::Arc::new(like_db.into_connection())),
            WatchHistoryRepository::new(std::sync::Arc::new(watch_db.into_connection())),
            Arc::new(LocalStorage::new(PathBuf::from("/tmp"), "/media".to_string())),
        )
    }

    #[tokio::test]
    async fn test_get_by_id_returns_pre_increment_views() {
        let video_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_video("v1", "owner", true)]])
            // view counter increment
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }]);
        let user_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_owner("owner")]]);
        let like_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[maplit::btreemap! {
                "num_items" => sea_orm::Value::BigInt(Some(3))
            }]])
            .append_query_results([Vec::<like::Model>::new()]);
        let watch_db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[
            watch_history::Model {
                id: "h1".to_string(),
                user_id: "viewer".to_string(),
                video_id: "v1".to_string(),
                watched_at: Utc::now().into(),
            },
        ]]);

        let service = service_with_all(video_db, user_db, like_db, watch_db);
        let detail = service.get_by_id("v1", Some("viewer")).await.unwrap();

        // Fixture has 7 views; the payload carries the count before this view.
        assert_eq!(detail.video.views, 7);
        assert_eq!(detail.likes_count, 3);
        assert!(!detail.is_liked);
        assert_eq!(detail.video.owner.unwrap().username, "alice");
    }

    #[tokio::test]
    async fn test_get_by_id_survives_increment_failure() {
        let video_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_video("v1", "owner", true)]])
            .append_exec_errors([DbErr::Custom("connection reset".to_string())]);
        let user_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_owner("owner")]]);
        let like_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[maplit::btreemap! {
                "num_items" => sea_orm::Value::BigInt(Some(0))
            }]]);
        let watch_db = MockDatabase::new(DatabaseBackend::Postgres);

        let service = service_with_all(video_db, user_db, like_db, watch_db);
        let detail = service.get_by_id("v1", None).await.unwrap();

        assert_eq!(detail.video.views, 7);
    }

    #[tokio::test]
    async fn test_get_by_id_survives_watch_history_failure() {
        let video_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_video("v1", "owner", true)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }]);
        let user_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_owner("owner")]]);
        let like_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[maplit::btreemap! {
                "num_items" => sea_orm::Value::BigInt(Some(0))
            }]])
            .append_query_results([Vec::<like::Model>::new()]);
        let watch_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Custom("connection reset".to_string())]);

        let service = service_with_all(video_db, user_db, like_db, watch_db);
        let result = service.get_by_id("v1", Some("viewer")).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_update_details_rejects_non_owner() {
        let video = create_test_video("v1", "owner", true);
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[video]]),
        );

        let result = service
            .update_details("intruder", "v1", "New title", "desc")
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_update_details_requires_title() {
        let service = service_with(MockDatabase::new(DatabaseBackend::Postgres));

        let result = service.update_details("owner", "v1", "  ", "desc").await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete_unknown_video() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<video::Model>::new()]),
        );

        let result = service.delete("owner", "missing").await;

        assert!(matches!(result, Err(AppError::VideoNotFound(_))));
    }

    #[tokio::test]
    async fn test_publish_requires_title() {
        let service = service_with(MockDatabase::new(DatabaseBackend::Postgres));

        let result = service
            .publish(
                "owner",
                "",
                "desc",
                (vec![1], "video/mp4".to_string()),
                (vec![2], "image/png".to_string()),
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
