//! Channel dashboard aggregates.

use serde::Serialize;

use playtube_common::AppResult;
use playtube_db::repositories::{
    LikeRepository, SubscriptionRepository, VideoRepository, VideoSort,
};

use crate::services::video::{VideoPage, VideoService};

/// Channel statistics for the dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    /// Number of videos the channel has uploaded.
    pub total_videos: u64,
    /// Views summed over all of the channel's videos.
    pub total_views: i64,
    /// Number of subscribers.
    pub total_subscribers: u64,
    /// Likes summed over all of the channel's videos.
    pub total_likes: u64,
}

/// Dashboard service for business logic.
#[derive(Clone)]
pub struct DashboardService {
    video_repo: VideoRepository,
    subscription_repo: SubscriptionRepository,
    like_repo: LikeRepository,
    video_service: VideoService,
}

impl DashboardService {
    /// Create a new dashboard service.
    #[must_use]
    pub const fn new(
        video_repo: VideoRepository,
        subscription_repo: SubscriptionRepository,
        like_repo: LikeRepository,
        video_service: VideoService,
    ) -> Self {
        Self {
            video_repo,
            subscription_repo,
            like_repo,
            video_service,
        }
    }

    /// Aggregate stats for the authenticated channel.
    pub async fn channel_stats(&self, user_id: &str) -> AppResult<ChannelStats> {
        let total_videos = self.video_repo.count_by_owner(user_id).await?;
        let total_views = self.video_repo.total_views_by_owner(user_id).await?;
        let total_subscribers = self.subscription_repo.count_subscribers(user_id).await?;
        let total_likes = self.like_repo.count_video_likes_for_owner(user_id).await?;

        Ok(ChannelStats {
            total_videos,
            total_views,
            total_subscribers,
            total_likes,
        })
    }

    /// The channel's own videos, paginated, including unpublished ones.
    pub async fn channel_videos(
        &self,
        user_id: &str,
        page: u64,
        limit: u64,
    ) -> AppResult<VideoPage> {
        let page = page.max(1);
        let limit = limit.clamp(1, 100);

        let (videos, total_pages) = self
            .video_repo
            .list(
                Some(user_id),
                None,
                false,
                VideoSort::CreatedAt,
                false,
                page,
                limit,
            )
            .await?;

        let views = self.video_service.resolve_owners(videos).await?;

        Ok(VideoPage {
            videos: views,
            page,
            limit,
            total_pages,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use playtube_common::storage::LocalStorage;
    use playtube_db::repositories::{UserRepository, WatchHistoryRepository};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::path::PathBuf;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_channel_stats_aggregates() {
        let video_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // count_by_owner
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(3))
                }]])
                // total_views_by_owner (per-video view counters)
                .append_query_results([vec![
                    maplit::btreemap! {
                        "views" => sea_orm::Value::BigInt(Some(10))
                    },
                    maplit::btreemap! {
                        "views" => sea_orm::Value::BigInt(Some(32))
                    },
                ]])
                .into_connection(),
        );
        let sub_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(5))
                }]])
                .into_connection(),
        );
        let like_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(7))
                }]])
                .into_connection(),
        );
        let empty = || Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let video_service = VideoService::new(
            VideoRepository::new(empty()),
            UserRepository::new(empty()),
            LikeRepository::new(empty()),
            WatchHistoryRepository::new(empty()),
            Arc::new(LocalStorage::new(PathBuf::from("/tmp"), "/media".to_string())),
        );

        let service = DashboardService::new(
            VideoRepository::new(video_db),
            SubscriptionRepository::new(sub_db),
            LikeRepository::new(like_db),
            video_service,
        );

        let stats = service.channel_stats("u1").await.unwrap();

        assert_eq!(stats.total_videos, 3);
        assert_eq!(stats.total_views, 42);
        assert_eq!(stats.total_subscribers, 5);
        assert_eq!(stats.total_likes, 7);
    }
}
