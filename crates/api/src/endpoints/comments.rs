//! Comment endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};

use playtube_common::AppResult;
use playtube_core::{AddCommentInput, CommentView};
use playtube_db::entities::comment;

/// A bare comment, as returned by the mutating endpoints.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub content: String,
    pub video_id: String,
    pub owner_id: String,
    pub created_at: String,
}

impl From<comment::Model> for CommentResponse {
    fn from(c: comment::Model) -> Self {
        Self {
            id: c.id,
            content: c.content,
            video_id: c.video_id,
            owner_id: c.owner_id,
            created_at: c.created_at.to_rfc3339(),
        }
    }
}

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

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

/// One page of comments.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPage {
    pub comments: Vec<CommentView>,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

/// Comments on a video, newest first.
async fn list_by_video(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<CommentPage>> {
    let (comments, total_pages) = state
        .comment_service
        .list_by_video(
            &video_id,
            viewer.as_ref().map(|u| u.id.as_str()),
            query.page,
            query.limit,
        )
        .await?;

    Ok(ApiResponse::ok(
        CommentPage {
            comments,
            page: query.page,
            limit: query.limit,
            total_pages,
        },
        "Comments fetched",
    ))
}

/// Add a comment to a video.
async fn add(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Json(input): Json<AddCommentInput>,
) -> AppResult<ApiResponse<CommentResponse>> {
    let created = state.comment_service.add(&user.id, &video_id, input).await?;
    Ok(ApiResponse::created(created.into(), "Comment added"))
}

/// Edit a comment.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
    Json(input): Json<AddCommentInput>,
) -> AppResult<ApiResponse<CommentResponse>> {
    let updated = state
        .comment_service
        .update(&user.id, &comment_id, input)
        .await?;

    Ok(ApiResponse::ok(updated.into(), "Comment updated"))
}

/// Delete a comment.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state.comment_service.delete(&user.id, &comment_id).await?;
    Ok(ApiResponse::ok((), "Comment deleted"))
}

/// Create the comment router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{videoId}", get(list_by_video).post(add))
        .route("/c/{commentId}", axum::routing::patch(update).delete(delete))
}
