//! Mail verification endpoints.

use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;

use playtube_common::{AppError, AppResult};

use crate::{middleware::AppState, response::ApiResponse};

/// Query carrying the user ID of a verification link.
#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    pub id: Option<String>,
}

/// Mark a user's mail address as verified.
async fn verify_mail(
    State(state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> AppResult<ApiResponse<()>> {
    let id = query
        .id
        .ok_or_else(|| AppError::BadRequest("Missing query parameter: id".to_string()))?;

    state.account_service.verify_mail(&id).await?;
    Ok(ApiResponse::ok((), "Mail address verified"))
}

/// Re-send the verification mail.
async fn send_mail(
    State(state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> AppResult<ApiResponse<()>> {
    let id = query
        .id
        .ok_or_else(|| AppError::BadRequest("Missing query parameter: id".to_string()))?;

    state.account_service.send_verification_mail(&id).await?;
    Ok(ApiResponse::ok((), "Verification mail sent"))
}

/// Landing route for a completed verification redirect.
async fn success() -> ApiResponse<()> {
    ApiResponse::ok((), "Verification successful")
}

/// Landing route for a failed verification redirect.
async fn failure() -> AppResult<ApiResponse<()>> {
    Err(AppError::BadRequest("Verification failed".to_string()))
}

/// Create the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/verify-mail", get(verify_mail))
        .route("/send-mail", get(send_mail))
        .route("/success", get(success))
        .route("/failure", get(failure))
}
