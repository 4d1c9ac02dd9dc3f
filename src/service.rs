//! History service: identifier rendering plus storage, behind the HTTP layer.

use std::sync::Arc;

use crate::identifier::{IdGenerator, RenderError};
use crate::storage::{HistoryStore, StoreError};
use crate::types::{Alert, Message, MessageEntry};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("failed to generate id: {0}")]
    Render(#[from] RenderError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_not_found())
    }
}

/// Records webhook payloads and serves them back.
///
/// Cheap to clone; clones share the store and the compiled template.
#[derive(Clone)]
pub struct HistoryService {
    store: Arc<dyn HistoryStore>,
    id_generator: Arc<IdGenerator>,
}

impl HistoryService {
    pub fn new(store: Arc<dyn HistoryStore>, id_generator: IdGenerator) -> Self {
        Self {
            store,
            id_generator: Arc::new(id_generator),
        }
    }

    /// Render the identifier for `msg` and store its alerts under it.
    ///
    /// An existing entry with the same identifier is replaced.
    pub fn record(&self, msg: &Message) -> Result<String, ServiceError> {
        let id = self.id_generator.render(msg)?;
        self.store.set(&id, &msg.alerts)?;
        tracing::debug!(id = %id, alerts = msg.alerts.len(), "Recorded webhook");
        Ok(id)
    }

    pub fn get(&self, id: &str) -> Result<Vec<Alert>, ServiceError> {
        Ok(self.store.get(id)?)
    }

    pub fn list(&self) -> Result<Vec<MessageEntry>, ServiceError> {
        Ok(self.store.list()?)
    }

    pub fn flush(&self) -> Result<(), ServiceError> {
        Ok(self.store.flush()?)
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    pub fn id_generator(&self) -> &IdGenerator {
        &self.id_generator
    }
}
