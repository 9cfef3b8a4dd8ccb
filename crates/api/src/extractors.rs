//! Request extractors.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use playtube_common::AppError;
use playtube_db::entities::user;

/// Authenticated user extractor.
///
/// Rejects with a 401 rendered through the uniform failure envelope.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by the auth middleware on a valid access token
        parts
            .extensions
            .get::<user::Model>()
            .cloned()
            .map(AuthUser)
            .ok_or(AppError::Unauthorized)
    }
}

/// Optional authenticated user extractor.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<user::Model>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<user::Model>().cloned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::{
        body::to_bytes,
        http::{Request, StatusCode},
        response::IntoResponse,
    };
    use chrono::Utc;

    fn create_test_user(id: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            full_name: "Alice".to_string(),
            password_hash: "$argon2id$test".to_string(),
            avatar_url: "/media/avatar.png".to_string(),
            cover_image_url: None,
            refresh_token: None,
            is_verified: false,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_missing_token_rejects_with_envelope() {
        let (mut parts, ()) = Request::builder().uri("/").body(()).unwrap().into_parts();

        let rejection = AuthUser::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();

        let response = rejection.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["statusCode"], 401);
        assert_eq!(value["success"], false);
    }

    #[tokio::test]
    async fn test_extracts_user_from_extensions() {
        let (mut parts, ()) = Request::builder().uri("/").body(()).unwrap().into_parts();
        parts.extensions.insert(create_test_user("u1"));

        let AuthUser(user) = AuthUser::from_request_parts(&mut parts, &())
            .await
            .unwrap();

        assert_eq!(user.id, "u1");
    }

    #[tokio::test]
    async fn test_maybe_auth_user_defaults_to_none() {
        let (mut parts, ()) = Request::builder().uri("/").body(()).unwrap().into_parts();

        let MaybeAuthUser(user) = MaybeAuthUser::from_request_parts(&mut parts, &())
            .await
            .unwrap();

        assert!(user.is_none());
    }
}
