//! Like endpoints.

use axum::{
    Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::Serialize;

use playtube_common::AppResult;
use playtube_core::{ToggleResult, VideoView};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Which way a toggle went.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResponse {
    pub liked: bool,
}

impl From<ToggleResult> for ToggleResponse {
    fn from(result: ToggleResult) -> Self {
        Self {
            liked: result == ToggleResult::Added,
        }
    }
}

/// Toggle a like on a video.
async fn toggle_video(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> AppResult<ApiResponse<ToggleResponse>> {
    let result = state.like_service.toggle_video_like(&user.id, &video_id).await?;
    Ok(ApiResponse::ok(result.into(), "Video like toggled"))
}

/// Toggle a like on a comment.
async fn toggle_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
) -> AppResult<ApiResponse<ToggleResponse>> {
    let result = state
        .like_service
        .toggle_comment_like(&user.id, &comment_id)
        .await?;

    Ok(ApiResponse::ok(result.into(), "Comment like toggled"))
}

/// Toggle a like on a tweet.
async fn toggle_tweet(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(tweet_id): Path<String>,
) -> AppResult<ApiResponse<ToggleResponse>> {
    let result = state.like_service.toggle_tweet_like(&user.id, &tweet_id).await?;
    Ok(ApiResponse::ok(result.into(), "Tweet like toggled"))
}

/// Videos the user has liked.
async fn liked_videos(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<VideoView>>> {
    let videos = state.like_service.liked_videos(&user.id).await?;
    Ok(ApiResponse::ok(videos, "Liked videos fetched"))
}

/// Create the like router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/toggle/v/{videoId}", post(toggle_video))
        .route("/toggle/c/{commentId}", post(toggle_comment))
        .route("/toggle/t/{tweetId}", post(toggle_tweet))
        .route("/videos", get(liked_videos))
}
