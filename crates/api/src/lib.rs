//! HTTP API layer for playtube.
//!
//! - **Endpoints**: the versioned REST API
//! - **Extractors**: authentication
//! - **Middleware**: token verification, logging, CORS
//!
//! Built on Axum 0.8 with a Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::AppState;
