//! Healthcheck endpoint.

use axum::{Router, routing::get};
use serde::Serialize;

use crate::{middleware::AppState, response::ApiResponse};

/// Healthcheck payload.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
}

async fn healthcheck() -> ApiResponse<HealthResponse> {
    ApiResponse::ok(HealthResponse { status: "ok" }, "Service is healthy")
}

/// Create the healthcheck router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(healthcheck))
}
