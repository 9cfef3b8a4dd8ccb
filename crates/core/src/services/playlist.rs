//! Playlist service.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

use playtube_common::{AppError, AppResult, IdGenerator};
use playtube_db::{
    entities::playlist,
    repositories::{PlaylistRepository, UserRepository, VideoRepository},
};

use crate::services::account::UserSummary;
use crate::services::video::VideoView;

/// Payload for creating or updating a playlist.
#[derive(Debug, Deserialize, Validate)]
pub struct PlaylistInput {
    /// Playlist name.
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
}

/// Public view of a playlist.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistView {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: String,
    pub created_at: sea_orm::prelude::DateTimeWithTimeZone,
}

impl From<playlist::Model> for PlaylistView {
    fn from(model: playlist::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            owner_id: model.owner_id,
            created_at: model.created_at,
        }
    }
}

/// A playlist with its videos resolved in position order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistWithVideos {
    #[serde(flatten)]
    pub playlist: PlaylistView,
    pub videos: Vec<VideoView>,
}

/// Playlist service for business logic.
#[derive(Clone)]
pub struct PlaylistService {
    playlist_repo: PlaylistRepository,
    video_repo: VideoRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl PlaylistService {
    /// Create a new playlist service.
    #[must_use]
    pub const fn new(
        playlist_repo: PlaylistRepository,
        video_repo: VideoRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            playlist_repo,
            video_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a playlist.
    pub async fn create(&self, owner_id: &str, input: PlaylistInput) -> AppResult<PlaylistView> {
        input.validate()?;

        let model = playlist::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(input.name),
            description: Set(input.description),
            owner_id: Set(owner_id.to_string()),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let created = self.playlist_repo.create(model).await?;
        Ok(created.into())
    }

    /// Playlists owned by a user.
    pub async fn list_by_owner(&self, owner_id: &str) -> AppResult<Vec<PlaylistView>> {
        let playlists = self.playlist_repo.find_by_owner(owner_id).await?;
        Ok(playlists.into_iter().map(Into::into).collect())
    }

    /// A playlist with its videos resolved in position order.
    pub async fn get_by_id(&self, playlist_id: &str) -> AppResult<PlaylistWithVideos> {
        let playlist = self.playlist_repo.get_by_id(playlist_id).await?;

        let entries = self.playlist_repo.find_entries(playlist_id).await?;
        let video_ids: Vec<String> = entries.iter().map(|e| e.video_id.clone()).collect();
        let videos = self.video_repo.find_by_ids(&video_ids).await?;

        let owner_ids: Vec<String> = videos.iter().map(|v| v.owner_id.clone()).collect();
        let owners = self.user_repo.find_by_ids(&owner_ids).await?;
        let owners_by_id: HashMap<_, _> = owners
            .iter()
            .map(|u| (u.id.clone(), UserSummary::from(u)))
            .collect();

        let videos_by_id: HashMap<_, _> =
            videos.into_iter().map(|v| (v.id.clone(), v)).collect();

        // Entries keep their insertion order; dangling ones are skipped.
        let resolved = video_ids
            .iter()
            .filter_map(|id| videos_by_id.get(id))
            .map(|v| VideoView::from_model(v.clone(), owners_by_id.get(&v.owner_id).cloned()))
            .collect();

        Ok(PlaylistWithVideos {
            playlist: playlist.into(),
            videos: resolved,
        })
    }

    /// Add a video to a playlist. Owner only; duplicate adds are a no-op.
    pub async fn add_video(
        &self,
        user_id: &str,
        playlist_id: &str,
        video_id: &str,
    ) -> AppResult<()> {
        self.owned_playlist(user_id, playlist_id).await?;
        self.video_repo.get_by_id(video_id).await?;

        let added = self.playlist_repo.add_video(playlist_id, video_id).await?;
        if !added {
            tracing::debug!(playlist_id = %playlist_id, video_id = %video_id, "Video already in playlist");
        }

        Ok(())
    }

    /// Remove a video from a playlist. Owner only.
    pub async fn remove_video(
        &self,
        user_id: &str,
        playlist_id: &str,
        video_id: &str,
    ) -> AppResult<()> {
        self.owned_playlist(user_id, playlist_id).await?;
        self.playlist_repo.remove_video(playlist_id, video_id).await?;
        Ok(())
    }

    /// Rename or re-describe a playlist. Owner only.
    pub async fn update(
        &self,
        user_id: &str,
        playlist_id: &str,
        input: PlaylistInput,
    ) -> AppResult<PlaylistView> {
        input.validate()?;

        let playlist = self.owned_playlist(user_id, playlist_id).await?;

        let model = playlist::ActiveModel {
            id: Set(playlist.id),
            name: Set(input.name),
            description: Set(input.description),
            updated_at: Set(Some(Utc::now().into())),
            ..Default::default()
        };

        let updated = self.playlist_repo.update(model).await?;
        Ok(updated.into())
    }

    /// Delete a playlist. Owner only. Entries cascade.
    pub async fn delete(&self, user_id: &str, playlist_id: &str) -> AppResult<()> {
        self.owned_playlist(user_id, playlist_id).await?;
        self.playlist_repo.delete(playlist_id).await?;
        Ok(())
    }

    async fn owned_playlist(
        &self,
        user_id: &str,
        playlist_id: &str,
    ) -> AppResult<playlist::Model> {
        let playlist = self.playlist_repo.get_by_id(playlist_id).await?;

        if playlist.owner_id != user_id {
            return Err(AppError::Forbidden(
                "Only the owner can modify this playlist".to_string(),
            ));
        }

        Ok(playlist)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_playlist(id: &str, owner_id: &str) -> playlist::Model {
        playlist::Model {
            id: id.to_string(),
            name: "Watch later".to_string(),
            description: None,
            owner_id: owner_id.to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn service_with(playlist_db: MockDatabase) -> PlaylistService {
        let empty = || Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        PlaylistService::new(
            PlaylistRepository::new(Arc::new(playlist_db.into_connection())),
            VideoRepository::new(empty()),
            UserRepository::new(empty()),
        )
    }

    #[tokio::test]
    async fn test_create_requires_name() {
        let service = service_with(MockDatabase::new(DatabaseBackend::Postgres));

        let result = service
            .create(
                "u1",
                PlaylistInput {
                    name: String::new(),
                    description: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_add_video_rejects_non_owner() {
        let playlist = create_test_playlist("p1", "owner");
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[playlist]]),
        );

        let result = service.add_video("intruder", "p1", "v1").await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_playlist() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<playlist::Model>::new()]),
        );

        let result = service.delete("u1", "missing").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
