//! Liveness endpoint

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use super::ApiState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Storage backend in use
    pub backend: &'static str,
    pub id_template: String,
}

/// GET /health
pub async fn get_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        backend: state.service.backend_name(),
        id_template: state.service.id_generator().template().to_string(),
    })
}
