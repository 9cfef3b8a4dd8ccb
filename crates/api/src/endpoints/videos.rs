//! Video endpoints.

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    routing::{get, patch},
};
use serde::Deserialize;

use playtube_common::{AppError, AppResult};
use playtube_core::{ListVideosParams, VideoDetail, VideoPage, VideoView};
use playtube_db::repositories::VideoSort;

use crate::{
    endpoints::users::single_file,
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

/// Listing query parameters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Free-text search over title and description.
    pub query: Option<String>,
    /// Sort key: `createdAt`, `views`, `duration` or `title`.
    pub sort_by: Option<String>,
    /// `asc` or `desc` (the default).
    pub sort_type: Option<String>,
    /// Restrict to one owner.
    pub user_id: Option<String>,
}

const fn default_page() -> u64 {
    1
}

const fn default_limit() -> u64 {
    10
}

/// Details update request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVideoRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// List published videos.
async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<VideoPage>> {
    let sort = match query.sort_by.as_deref() {
        None | Some("createdAt") => VideoSort::CreatedAt,
        Some("views") => VideoSort::Views,
        Some("duration") => VideoSort::Duration,
        Some("title") => VideoSort::Title,
        Some(other) => {
            return Err(AppError::BadRequest(format!("Unknown sort key: {other}")));
        }
    };

    let page = state
        .video_service
        .list(ListVideosParams {
            page: query.page,
            limit: query.limit,
            owner_id: query.user_id,
            search: query.query,
            sort,
            ascending: query.sort_type.as_deref() == Some("asc"),
        })
        .await?;

    Ok(ApiResponse::ok(page, "Videos fetched"))
}

/// Publish a video from a multipart form.
async fn publish(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<VideoView>> {
    let mut title = None;
    let mut description = String::new();
    let mut video_file: Option<(Vec<u8>, String)> = None;
    let mut thumbnail: Option<(Vec<u8>, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => {
                title = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?,
                );
            }
            "description" => {
                description = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
            }
            "videoFile" | "thumbnail" => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?
                    .to_vec();

                if name == "videoFile" {
                    video_file = Some((data, content_type));
                } else {
                    thumbnail = Some((data, content_type));
                }
            }
            _ => {}
        }
    }

    let title = title.ok_or_else(|| AppError::BadRequest("Missing field: title".to_string()))?;
    let video_file =
        video_file.ok_or_else(|| AppError::BadRequest("Missing field: videoFile".to_string()))?;
    let thumbnail =
        thumbnail.ok_or_else(|| AppError::BadRequest("Missing field: thumbnail".to_string()))?;

    let video = state
        .video_service
        .publish(&user.id, &title, &description, video_file, thumbnail)
        .await?;

    Ok(ApiResponse::created(video, "Video published"))
}

/// Fetch one video; counts the view and records watch history.
async fn get_by_id(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> AppResult<ApiResponse<VideoDetail>> {
    let video = state
        .video_service
        .get_by_id(&video_id, viewer.as_ref().map(|u| u.id.as_str()))
        .await?;

    Ok(ApiResponse::ok(video, "Video fetched"))
}

/// Update title and description.
async fn update_details(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Json(req): Json<UpdateVideoRequest>,
) -> AppResult<ApiResponse<VideoView>> {
    let video = state
        .video_service
        .update_details(&user.id, &video_id, &req.title, &req.description)
        .await?;

    Ok(ApiResponse::ok(video, "Video updated"))
}

/// Delete a video.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state.video_service.delete(&user.id, &video_id).await?;
    Ok(ApiResponse::ok((), "Video deleted"))
}

/// Replace the thumbnail.
async fn update_thumbnail(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    multipart: Multipart,
) -> AppResult<ApiResponse<VideoView>> {
    let (data, content_type) = single_file(multipart, "thumbnail").await?;
    let video = state
        .video_service
        .update_thumbnail(&user.id, &video_id, data, &content_type)
        .await?;

    Ok(ApiResponse::ok(video, "Thumbnail updated"))
}

/// Flip the publish flag.
async fn toggle_publish(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> AppResult<ApiResponse<VideoView>> {
    let video = state
        .video_service
        .toggle_publish(&user.id, &video_id)
        .await?;

    Ok(ApiResponse::ok(video, "Publish status toggled"))
}

/// Create the video router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(publish))
        .route("/{videoId}", get(get_by_id).patch(update_details).delete(delete))
        .route("/{videoId}/thumbnail", patch(update_thumbnail))
        .route("/toggle/publish/{videoId}", patch(toggle_publish))
}
