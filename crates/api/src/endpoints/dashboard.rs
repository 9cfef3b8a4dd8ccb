//! Channel dashboard endpoints.

use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;

use playtube_common::AppResult;
use playtube_core::{ChannelStats, VideoPage};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Pagination query.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

const fn default_page() -> u64 {
    1
}

const fn default_limit() -> u64 {
    10
}

/// Aggregate stats for the authenticated channel.
async fn stats(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<ChannelStats>> {
    let stats = state.dashboard_service.channel_stats(&user.id).await?;
    Ok(ApiResponse::ok(stats, "Channel stats fetched"))
}

/// The channel's own videos, including unpublished ones.
async fn videos(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<VideoPage>> {
    let page = state
        .dashboard_service
        .channel_videos(&user.id, query.page, query.limit)
        .await?;

    Ok(ApiResponse::ok(page, "Channel videos fetched"))
}

/// Create the dashboard router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats", get(stats))
        .route("/videos", get(videos))
}
