//! Video repository.

use std::sync::Arc;

use crate::entities::{video, Video};
use playtube_common::{AppError, AppResult};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};

/// Sort key for video listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoSort {
    /// Creation time (the default).
    #[default]
    CreatedAt,
    /// View counter.
    Views,
    /// Playback duration.
    Duration,
    /// Title, lexicographic.
    Title,
}

impl VideoSort {
    const fn column(self) -> video::Column {
        match self {
            Self::CreatedAt => video::Column::CreatedAt,
            Self::Views => video::Column::Views,
            Self::Duration => video::Column::Duration,
            Self::Title => video::Column::Title,
        }
    }
}

/// Video repository for database operations.
#[derive(Clone)]
pub struct VideoRepository {
    db: Arc<DatabaseConnection>,
}

impl VideoRepository {
    /// Create a new video repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a video by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<video::Model>> {
        Video::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a video by ID, failing when absent.
    pub async fn get_by_id(&self, id: &str) -> AppResult<video::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::VideoNotFound(id.to_string()))
    }

    /// Create a new video.
    pub async fn create(&self, model: video::ActiveModel) -> AppResult<video::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a video from an active model.
    pub async fn update(&self, model: video::ActiveModel) -> AppResult<video::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a video. Comments, likes, playlist entries and history rows
    /// are removed by the storage engine's cascades.
    pub async fn delete(&self, id: &str) -> AppResult<u64> {
        let result = Video::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Increment the view counter atomically (single UPDATE query, no fetch).
    pub async fn increment_views(&self, id: &str) -> AppResult<()> {
        Video::update_many()
            .col_expr(
                video::Column::Views,
                Expr::col(video::Column::Views).add(1),
            )
            .filter(video::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// List videos, paginated.
    ///
    /// Optional owner filter and free-text search over title/description.
    /// Returns the page of videos plus the total page count.
    pub async fn list(
        &self,
        owner_id: Option<&str>,
        search: Option<&str>,
        published_only: bool,
        sort: VideoSort,
        ascending: bool,
        page: u64,
        limit: u64,
    ) -> AppResult<(Vec<video::Model>, u64)> {
        let mut query = Video::find();

        if let Some(owner_id) = owner_id {
            query = query.filter(video::Column::OwnerId.eq(owner_id));
        }

        if let Some(search) = search {
            let pattern = format!("%{search}%");
            query = query.filter(
                Condition::any()
                    .add(video::Column::Title.like(pattern.clone()))
                    .add(video::Column::Description.like(pattern)),
            );
        }

        if published_only {
            query = query.filter(video::Column::IsPublished.eq(true));
        }

        let order = if ascending { Order::Asc } else { Order::Desc };
        let paginator = query
            .order_by(sort.column(), order)
            .paginate(self.db.as_ref(), limit.max(1));

        let total_pages = paginator
            .num_pages()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let videos = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((videos, total_pages))
    }

    /// Find videos by a set of IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<video::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        Video::find()
            .filter(video::Column::Id.is_in(ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count videos owned by a user.
    pub async fn count_by_owner(&self, owner_id: &str) -> AppResult<u64> {
        Video::find()
            .filter(video::Column::OwnerId.eq(owner_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Total view count across a user's videos.
    pub async fn total_views_by_owner(&self, owner_id: &str) -> AppResult<i64> {
        let views: Vec<i64> = Video::find()
            .select_only()
            .column(video::Column::Views)
            .filter(video::Column::OwnerId.eq(owner_id))
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(views.into_iter().sum())
    }
}
