//! API endpoints.

mod auth;
mod comments;
mod dashboard;
mod healthcheck;
mod likes;
mod playlists;
mod subscriptions;
mod tweets;
mod users;
mod videos;

use axum::Router;

use crate::middleware::AppState;

/// Create the versioned API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/healthcheck", healthcheck::router())
        .nest("/user", users::router())
        .nest("/auth", auth::router())
        .nest("/videos", videos::router())
        .nest("/comment", comments::router())
        .nest("/likes", likes::router())
        .nest("/subscriptions", subscriptions::router())
        .nest("/playlist", playlists::router())
        .nest("/tweet", tweets::router())
        .nest("/dashboard", dashboard::router())
}
