//! REST API module using Axum
//!
//! Thin HTTP surface over [`crate::service::HistoryService`]:
//! - `NotFound` becomes 404
//! - a payload the identifier template cannot render becomes 422
//! - any other storage failure becomes 500

pub mod envelope;
pub mod handlers;
mod routes;

pub use handlers::ApiState;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::defaults::DEFAULT_MAX_BODY_BYTES;

/// Create the complete application router with the default body limit.
pub fn create_app(state: ApiState) -> Router {
    create_app_with_limit(state, DEFAULT_MAX_BODY_BYTES)
}

/// Create the application router, rejecting bodies larger than `max_body_bytes`.
pub fn create_app_with_limit(state: ApiState, max_body_bytes: usize) -> Router {
    routes::api_routes(state)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
}
