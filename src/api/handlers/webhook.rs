//! Alertmanager webhook ingestion

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{debug, warn};

use super::{blocking, error_response, ApiState};
use crate::api::envelope::ApiErrorResponse;
use crate::types::{Message, MessageResponse};

/// POST /webhook
///
/// Stores the payload's alerts under the identifier rendered from it and
/// returns `{"id": "..."}`. A payload rendering to an existing identifier
/// replaces that entry.
pub async fn receive_webhook(
    State(state): State<ApiState>,
    payload: Result<Json<Message>, JsonRejection>,
) -> Response {
    let msg = match payload {
        Ok(Json(msg)) => msg,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Failed to decode JSON body");
            let detail = format!("failed to decode JSON body: {}", rejection.body_text());
            return if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                ApiErrorResponse::payload_too_large(detail)
            } else {
                ApiErrorResponse::bad_request(detail)
            };
        }
    };

    debug!(data = %msg, "Webhook received");

    let service = state.service.clone();
    match blocking(move || service.record(&msg)).await {
        Ok(id) => Json(MessageResponse { id }).into_response(),
        Err(e) => error_response(&e, "failed to save webhook info"),
    }
}
