//! API middleware.

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use axum_extra::extract::cookie::CookieJar;

use playtube_common::{config::AuthConfig, crypto};
use playtube_core::{
    AccountService, CommentService, DashboardService, LikeService, PlaylistService,
    SubscriptionService, TweetService, VideoService,
};
use playtube_db::repositories::UserRepository;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub account_service: AccountService,
    pub video_service: VideoService,
    pub comment_service: CommentService,
    pub like_service: LikeService,
    pub subscription_service: SubscriptionService,
    pub playlist_service: PlaylistService,
    pub tweet_service: TweetService,
    pub dashboard_service: DashboardService,
    pub user_repo: UserRepository,
    pub auth: AuthConfig,
}

/// Authentication middleware.
///
/// Accepts the access token from the `accessToken` cookie or an
/// `Authorization: Bearer` header. On a valid token the referenced user is
/// loaded and attached to the request extensions; invalid or absent tokens
/// simply leave the request unauthenticated and let the extractors decide.
pub async fn auth_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let jar = CookieJar::from_headers(req.headers());

    let token = jar
        .get("accessToken")
        .map(|c| c.value().to_string())
        .or_else(|| {
            req.headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "))
                .map(ToString::to_string)
        });

    let mut req = req;
    if let Some(token) = token
        && let Ok(claims) = crypto::verify_access_token(&token, &state.auth.access_token_secret)
        && let Ok(Some(user)) = state.user_repo.find_by_id(&claims.sub).await
    {
        req.extensions_mut().insert(user);
    }

    next.run(req).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::extractors::AuthUser;
    use axum::{
        Router,
        body::to_bytes,
        http::{Request, StatusCode},
        middleware,
        routing::get,
    };
    use chrono::Utc;
    use playtube_common::storage::{LocalStorage, MediaStorage};
    use playtube_db::entities::user;
    use playtube_db::repositories::{
        CommentRepository, LikeRepository, PlaylistRepository, SubscriptionRepository,
        TweetRepository, VideoRepository, WatchHistoryRepository,
    };
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::{path::PathBuf, sync::Arc};
    use tower::ServiceExt;

    fn test_auth_config() -> AuthConfig {
        AuthConfig {
            access_token_secret: "access-secret".to_string(),
            refresh_token_secret: "refresh-secret".to_string(),
            access_token_ttl_minutes: 15,
            refresh_token_ttl_days: 10,
        }
    }

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

    fn test_state(user_db: MockDatabase) -> AppState {
        let empty =
            || Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let storage: Arc<dyn MediaStorage> = Arc::new(LocalStorage::new(
            PathBuf::from("/tmp"),
            "/media".to_string(),
        ));

        let user_repo = UserRepository::new(Arc::new(user_db.into_connection()));
        let video_repo = VideoRepository::new(empty());
        let comment_repo = CommentRepository::new(empty());
        let like_repo = LikeRepository::new(empty());
        let subscription_repo = SubscriptionRepository::new(empty());
        let playlist_repo = PlaylistRepository::new(empty());
        let tweet_repo = TweetRepository::new(empty());
        let watch_repo = WatchHistoryRepository::new(empty());

        let video_service = VideoService::new(
            video_repo.clone(),
            user_repo.clone(),
            like_repo.clone(),
            watch_repo.clone(),
            Arc::clone(&storage),
        );

        AppState {
            account_service: AccountService::new(
                user_repo.clone(),
                subscription_repo.clone(),
                video_repo.clone(),
                watch_repo,
                storage,
                test_auth_config(),
                "http://localhost:8000".to_string(),
            ),
            video_service: video_service.clone(),
            comment_service: CommentService::new(
                comment_repo.clone(),
                video_repo.clone(),
                user_repo.clone(),
                like_repo.clone(),
            ),
            like_service: LikeService::new(
                like_repo.clone(),
                video_repo.clone(),
                comment_repo,
                tweet_repo.clone(),
                user_repo.clone(),
            ),
            subscription_service: SubscriptionService::new(
                subscription_repo.clone(),
                user_repo.clone(),
            ),
            playlist_service: PlaylistService::new(
                playlist_repo,
                video_repo.clone(),
                user_repo.clone(),
            ),
            tweet_service: TweetService::new(tweet_repo, user_repo.clone()),
            dashboard_service: DashboardService::new(
                video_repo,
                subscription_repo,
                like_repo,
                video_service,
            ),
            user_repo,
            auth: test_auth_config(),
        }
    }

    fn test_app(state: AppState) -> Router {
        Router::new()
            .route(
                "/me",
                get(|AuthUser(user): AuthUser| async move { user.id }),
            )
            .layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            ))
            .with_state(state)
    }

    #[tokio::test]
    async fn test_bearer_token_authenticates() {
        let token = playtube_common::crypto::issue_access_token(
            "u1",
            "alice",
            "alice@example.com",
            "access-secret",
            15,
        )
        .unwrap();

        let state = test_state(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("u1")]]),
        );

        let response = test_app(state)
            .oneshot(
                Request::builder()
                    .uri("/me")
                    .header("Authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"u1");
    }

    #[tokio::test]
    async fn test_missing_token_is_enveloped_401() {
        let state = test_state(MockDatabase::new(DatabaseBackend::Postgres));

        let response = test_app(state)
            .oneshot(Request::builder().uri("/me").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["statusCode"], 401);
        assert_eq!(value["success"], false);
    }

    #[tokio::test]
    async fn test_invalid_token_is_enveloped_401() {
        let state = test_state(MockDatabase::new(DatabaseBackend::Postgres));

        let response = test_app(state)
            .oneshot(
                Request::builder()
                    .uri("/me")
                    .header("Authorization", "Bearer not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["success"], false);
    }
}
