//! API route handlers
//!
//! - Webhook ingestion from Alertmanager
//! - History lookup by identifier and full listing
//! - Liveness

mod history;
mod status;
mod webhook;

pub use history::*;
pub use status::*;
pub use webhook::*;

use axum::response::Response;

use super::envelope::ApiErrorResponse;
use crate::service::{HistoryService, ServiceError};
use crate::storage::StoreError;

// ============================================================================
// API State
// ============================================================================

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub service: HistoryService,
}

impl ApiState {
    pub const fn new(service: HistoryService) -> Self {
        Self { service }
    }
}

/// Run a store call on the blocking pool so engine I/O never stalls the runtime.
async fn blocking<T, F>(f: F) -> Result<T, ServiceError>
where
    F: FnOnce() -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        ServiceError::Store(StoreError::Internal(format!("storage task failed: {e}")))
    })?
}

/// Map a service failure onto a response, logging it on the way.
fn error_response(err: &ServiceError, action: &str) -> Response {
    match err {
        ServiceError::Store(StoreError::NotFound { id }) => {
            tracing::debug!(id = %id, "{action}: not found");
            ApiErrorResponse::not_found(format!("no history for id '{id}'"))
        }
        ServiceError::Render(e) => {
            tracing::warn!(error = %e, "{action}");
            ApiErrorResponse::unprocessable(format!("failed to generate id from request body: {e}"))
        }
        ServiceError::Store(e) => {
            tracing::error!(error = %e, "{action}");
            ApiErrorResponse::internal(action)
        }
    }
}
