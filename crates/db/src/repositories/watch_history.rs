//! Watch history repository.

use std::sync::Arc;

use crate::entities::{watch_history, WatchHistory};
use playtube_common::{AppError, AppResult, IdGenerator};
use sea_orm::{
    sea_query::OnConflict, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    Set, TryInsertResult,
};

/// Watch history repository for database operations.
#[derive(Clone)]
pub struct WatchHistoryRepository {
    db: Arc<DatabaseConnection>,
    id_gen: IdGenerator,
}

impl WatchHistoryRepository {
    /// Create a new watch history repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            id_gen: IdGenerator::new(),
        }
    }

    /// Record that a user watched a video.
    ///
    /// Set semantics: a video already in the history is left untouched
    /// (`ON CONFLICT DO NOTHING` on the unique pair index). Returns whether
    /// a new row was recorded.
    pub async fn record(&self, user_id: &str, video_id: &str) -> AppResult<bool> {
        let model = watch_history::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            video_id: Set(video_id.to_string()),
            watched_at: Set(chrono::Utc::now().into()),
        };

        let result = WatchHistory::insert(model)
            .on_conflict(
                OnConflict::columns([
                    watch_history::Column::UserId,
                    watch_history::Column::VideoId,
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

    /// A user's history rows, most recently watched first.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<watch_history::Model>> {
        WatchHistory::find()
            .filter(watch_history::Column::UserId.eq(user_id))
            .order_by_desc(watch_history::Column::WatchedAt)
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
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_row(id: &str, user_id: &str, video_id: &str) -> watch_history::Model {
        watch_history::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            video_id: video_id.to_string(),
            watched_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_record_inserts_new_row() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = WatchHistoryRepository::new(db);
        let recorded = repo.record("u1", "v1").await.unwrap();

        assert!(recorded);
    }

    #[tokio::test]
    async fn test_record_rewatch_is_noop() {
        // Conflict on the unique pair index: no row affected, nothing recorded.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = WatchHistoryRepository::new(db);
        let recorded = repo.record("u1", "v1").await.unwrap();

        assert!(!recorded);
    }

    #[tokio::test]
    async fn test_find_by_user() {
        let h1 = create_test_row("h1", "u1", "v1");
        let h2 = create_test_row("h2", "u1", "v2");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[h1, h2]])
                .into_connection(),
        );

        let repo = WatchHistoryRepository::new(db);
        let result = repo.find_by_user("u1").await.unwrap();

        assert_eq!(result.len(), 2);
    }
}
