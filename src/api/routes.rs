//! API route definitions
//!
//! - POST /webhook       - Alertmanager webhook receiver
//! - GET  /history       - Every stored entry
//! - GET  /history/:id   - Alerts stored under one identifier
//! - GET  /health        - Liveness

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{self, ApiState};

/// Create all API routes
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/webhook", post(handlers::receive_webhook))
        .route("/history", get(handlers::list_history))
        .route("/history/:id", get(handlers::get_history))
        .route("/health", get(handlers::get_health))
        .with_state(state)
}
