//! Playlist repository.

use std::sync::Arc;

use crate::entities::{playlist, playlist_video, Playlist, PlaylistVideo};
use playtube_common::{AppError, AppResult, IdGenerator};
use sea_orm::{
    sea_query::OnConflict, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TryInsertResult,
};

/// Playlist repository for database operations.
#[derive(Clone)]
pub struct PlaylistRepository {
    db: Arc<DatabaseConnection>,
    id_gen: IdGenerator,
}

impl PlaylistRepository {
    /// Create a new playlist repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            id_gen: IdGenerator::new(),
        }
    }

    /// Find a playlist by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<playlist::Model>> {
        Playlist::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a playlist by ID, failing when absent.
    pub async fn get_by_id(&self, id: &str) -> AppResult<playlist::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Playlist {id}")))
    }

    /// Create a new playlist.
    pub async fn create(&self, model: playlist::ActiveModel) -> AppResult<playlist::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a playlist from an active model.
    pub async fn update(&self, model: playlist::ActiveModel) -> AppResult<playlist::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a playlist. Its entries go with it via the storage cascade.
    pub async fn delete(&self, id: &str) -> AppResult<u64> {
        let result = Playlist::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Playlists owned by a user, newest first.
    pub async fn find_by_owner(&self, owner_id: &str) -> AppResult<Vec<playlist::Model>> {
        Playlist::find()
            .filter(playlist::Column::OwnerId.eq(owner_id))
            .order_by_desc(playlist::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Append a video to a playlist.
    ///
    /// A duplicate add is a no-op (`ON CONFLICT DO NOTHING` on the unique
    /// pair index). Returns whether the video was newly added.
    pub async fn add_video(&self, playlist_id: &str, video_id: &str) -> AppResult<bool> {
        let position = PlaylistVideo::find()
            .filter(playlist_video::Column::PlaylistId.eq(playlist_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let model = playlist_video::ActiveModel {
            id: Set(self.id_gen.generate()),
            playlist_id: Set(playlist_id.to_string()),
            video_id: Set(video_id.to_string()),
            position: Set(i32::try_from(position).unwrap_or(i32::MAX)),
            created_at: Set(chrono::Utc::now().into()),
        };

        let result = PlaylistVideo::insert(model)
            .on_conflict(
                OnConflict::columns([
                    playlist_video::Column::PlaylistId,
                    playlist_video::Column::VideoId,
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

    /// Remove a video from a playlist. Returns affected rows.
    pub async fn remove_video(&self, playlist_id: &str, video_id: &str) -> AppResult<u64> {
        let result = PlaylistVideo::delete_many()
            .filter(playlist_video::Column::PlaylistId.eq(playlist_id))
            .filter(playlist_video::Column::VideoId.eq(video_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Playlist entries in append order.
    pub async fn find_entries(&self, playlist_id: &str) -> AppResult<Vec<playlist_video::Model>> {
        PlaylistVideo::find()
            .filter(playlist_video::Column::PlaylistId.eq(playlist_id))
            .order_by_asc(playlist_video::Column::Position)
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

    fn create_test_playlist(id: &str, owner_id: &str, name: &str) -> playlist::Model {
        playlist::Model {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            owner_id: owner_id.to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_owner() {
        let p1 = create_test_playlist("p1", "u1", "Favorites");
        let p2 = create_test_playlist("p2", "u1", "Watch later");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[p1, p2]])
                .into_connection(),
        );

        let repo = PlaylistRepository::new(db);
        let result = repo.find_by_owner("u1").await.unwrap();

        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<playlist::Model>::new()])
                .into_connection(),
        );

        let repo = PlaylistRepository::new(db);
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
