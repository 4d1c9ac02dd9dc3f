//! History lookup and listing

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::{blocking, error_response, ApiState};

/// GET /history/:id
///
/// Returns the alert array stored under `id`, or 404.
pub async fn get_history(State(state): State<ApiState>, Path(id): Path<String>) -> Response {
    let service = state.service.clone();
    let lookup = id.clone();
    match blocking(move || service.get(&lookup)).await {
        Ok(alerts) => Json(alerts).into_response(),
        Err(e) => {
            tracing::debug!(id = %id, "History lookup failed");
            error_response(&e, "failed to read webhook history")
        }
    }
}

/// GET /history
///
/// Returns every `{id, alerts}` entry. Order is not meaningful.
pub async fn list_history(State(state): State<ApiState>) -> Response {
    let service = state.service.clone();
    match blocking(move || service.list()).await {
        Ok(entries) => Json(entries).into_response(),
        Err(e) => error_response(&e, "failed to list webhook history"),
    }
}
