//! Subscription endpoints.

use axum::{
    Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::Serialize;

use playtube_common::AppResult;
use playtube_core::{ToggleResult, UserSummary};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Which way a toggle went.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionToggleResponse {
    pub subscribed: bool,
}

/// Toggle a subscription to a channel.
async fn toggle(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> AppResult<ApiResponse<SubscriptionToggleResponse>> {
    let result = state
        .subscription_service
        .toggle(&user.id, &channel_id)
        .await?;

    Ok(ApiResponse::ok(
        SubscriptionToggleResponse {
            subscribed: result == ToggleResult::Added,
        },
        "Subscription toggled",
    ))
}

/// Users subscribed to a channel.
async fn subscribers(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> AppResult<ApiResponse<Vec<UserSummary>>> {
    let subscribers = state.subscription_service.subscribers(&channel_id).await?;
    Ok(ApiResponse::ok(subscribers, "Subscribers fetched"))
}

/// Channels a user subscribes to.
async fn subscribed_channels(
    State(state): State<AppState>,
    Path(subscriber_id): Path<String>,
) -> AppResult<ApiResponse<Vec<UserSummary>>> {
    let channels = state
        .subscription_service
        .subscribed_channels(&subscriber_id)
        .await?;

    Ok(ApiResponse::ok(channels, "Subscribed channels fetched"))
}

/// Create the subscription router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/c/{channelId}", post(toggle).get(subscribers))
        .route("/u/{subscriberId}", get(subscribed_channels))
}
