//! API response types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Uniform success envelope.
///
/// Every successful response carries the HTTP status both in the header and
/// in the body, alongside the payload and a human-readable message. Failures
/// are rendered by `AppError`'s `IntoResponse` in the same shape, minus the
/// `data` field.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub status_code: u16,
    pub data: T,
    pub message: String,
    pub success: bool,
}

impl<T: Serialize> ApiResponse<T> {
    /// A 200 response.
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::OK, data, message)
    }

    /// A 201 response.
    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::CREATED, data, message)
    }

    /// A response with an explicit status.
    pub fn with_status(status: StatusCode, data: T, message: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            data,
            message: message.into(),
            success: true,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let response = ApiResponse::ok(serde_json::json!({"id": "u1"}), "Fetched");
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["statusCode"], 200);
        assert_eq!(value["data"]["id"], "u1");
        assert_eq!(value["message"], "Fetched");
        assert_eq!(value["success"], true);
    }

    #[test]
    fn test_created_status() {
        let response = ApiResponse::created((), "Created");

        assert_eq!(response.status_code, 201);
        assert!(response.success);
    }
}
