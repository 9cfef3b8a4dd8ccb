//! Playlist endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch, post},
};

use playtube_common::AppResult;
use playtube_core::{PlaylistInput, PlaylistView, PlaylistWithVideos};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Create a playlist.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<PlaylistInput>,
) -> AppResult<ApiResponse<PlaylistView>> {
    let created = state.playlist_service.create(&user.id, input).await?;
    Ok(ApiResponse::created(created, "Playlist created"))
}

/// Playlists owned by a user.
async fn list_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<Vec<PlaylistView>>> {
    let playlists = state.playlist_service.list_by_owner(&user_id).await?;
    Ok(ApiResponse::ok(playlists, "Playlists fetched"))
}

/// A playlist with its videos in position order.
async fn get_by_id(
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
) -> AppResult<ApiResponse<PlaylistWithVideos>> {
    let playlist = state.playlist_service.get_by_id(&playlist_id).await?;
    Ok(ApiResponse::ok(playlist, "Playlist fetched"))
}

/// Rename or re-describe a playlist.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
    Json(input): Json<PlaylistInput>,
) -> AppResult<ApiResponse<PlaylistView>> {
    let updated = state
        .playlist_service
        .update(&user.id, &playlist_id, input)
        .await?;

    Ok(ApiResponse::ok(updated, "Playlist updated"))
}

/// Delete a playlist.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state.playlist_service.delete(&user.id, &playlist_id).await?;
    Ok(ApiResponse::ok((), "Playlist deleted"))
}

/// Add a video to a playlist.
async fn add_video(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((video_id, playlist_id)): Path<(String, String)>,
) -> AppResult<ApiResponse<()>> {
    state
        .playlist_service
        .add_video(&user.id, &playlist_id, &video_id)
        .await?;

    Ok(ApiResponse::ok((), "Video added to playlist"))
}

/// Remove a video from a playlist.
async fn remove_video(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((video_id, playlist_id)): Path<(String, String)>,
) -> AppResult<ApiResponse<()>> {
    state
        .playlist_service
        .remove_video(&user.id, &playlist_id, &video_id)
        .await?;

    Ok(ApiResponse::ok((), "Video removed from playlist"))
}

/// Create the playlist router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route("/user/{userId}", get(list_by_user))
        .route("/{playlistId}", get(get_by_id).patch(update).delete(delete))
        .route("/add/{videoId}/{playlistId}", patch(add_video))
        .route("/remove/{videoId}/{playlistId}", patch(remove_video))
}
