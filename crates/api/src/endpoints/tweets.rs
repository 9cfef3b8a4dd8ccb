//! Tweet endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use playtube_common::AppResult;
use playtube_core::TweetView;
use playtube_db::entities::tweet;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Create or edit request.
#[derive(Debug, Deserialize)]
pub struct TweetRequest {
    pub content: String,
}

/// A bare tweet, as returned by the mutating endpoints.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetResponse {
    pub id: String,
    pub content: String,
    pub owner_id: String,
    pub created_at: String,
}

impl From<tweet::Model> for TweetResponse {
    fn from(t: tweet::Model) -> Self {
        Self {
            id: t.id,
            content: t.content,
            owner_id: t.owner_id,
            created_at: t.created_at.to_rfc3339(),
        }
    }
}

/// Create a tweet.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<TweetRequest>,
) -> AppResult<ApiResponse<TweetResponse>> {
    let created = state.tweet_service.create(&user.id, &req.content).await?;
    Ok(ApiResponse::created(created.into(), "Tweet created"))
}

/// Tweets by a user, newest first.
async fn list_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<Vec<TweetView>>> {
    let tweets = state.tweet_service.list_by_owner(&user_id).await?;
    Ok(ApiResponse::ok(tweets, "Tweets fetched"))
}

/// Edit a tweet.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(tweet_id): Path<String>,
    Json(req): Json<TweetRequest>,
) -> AppResult<ApiResponse<TweetResponse>> {
    let updated = state
        .tweet_service
        .update(&user.id, &tweet_id, &req.content)
        .await?;

    Ok(ApiResponse::ok(updated.into(), "Tweet updated"))
}

/// Delete a tweet.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(tweet_id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state.tweet_service.delete(&user.id, &tweet_id).await?;
    Ok(ApiResponse::ok((), "Tweet deleted"))
}

/// Create the tweet router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route("/user/{userId}", get(list_by_user))
        .route("/{tweetId}", axum::routing::patch(update).delete(delete))
}
