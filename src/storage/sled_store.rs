//! sled-backed history storage
//!
//! Key: the identifier's raw UTF-8 bytes
//! Value: JSON-encoded `Vec<Alert>`
//!
//! Durable and ephemeral modes share this code path and the same encoding;
//! only the way the engine is opened differs. sled reports its own
//! diagnostics through the `log` facade, which the process's tracing
//! subscriber picks up.

use std::sync::Arc;

use super::{HistoryStore, StoreConfig, StoreError};
use crate::types::{Alert, MessageEntry};

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        Self::Internal(format!("database error: {err}"))
    }
}

/// History storage on an embedded sled database.
///
/// Cloning is cheap and every clone shares one engine handle. The engine is
/// closed when the last clone is dropped; call [`HistoryStore::flush`] first
/// to make sure buffered writes hit disk.
#[derive(Clone)]
pub struct SledStore {
    db: Arc<sled::Db>,
    durable: bool,
}

impl SledStore {
    /// Open or create the database described by `config`.
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        let db = match config {
            StoreConfig::Durable { path } => {
                let db = sled::Config::new().path(path).open().map_err(|e| {
                    StoreError::Internal(format!(
                        "failed to open database at {}: {e}",
                        path.display()
                    ))
                })?;
                tracing::info!(path = %path.display(), entries = db.len(), "History database opened");
                db
            }
            StoreConfig::Ephemeral => {
                let db = sled::Config::new().temporary(true).open().map_err(|e| {
                    StoreError::Internal(format!("failed to open temporary database: {e}"))
                })?;
                tracing::info!("History database opened in memory (not durable)");
                db
            }
        };

        Ok(Self {
            db: Arc::new(db),
            durable: config.is_durable(),
        })
    }

    /// Get total number of stored identifiers
    pub fn len(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    pub const fn is_durable(&self) -> bool {
        self.durable
    }
}

fn encode(id: &str, alerts: &[Alert]) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec(alerts)
        .map_err(|e| StoreError::Internal(format!("failed to encode alerts for '{id}': {e}")))
}

fn decode(id: &str, bytes: &[u8]) -> Result<Vec<Alert>, StoreError> {
    serde_json::from_slice(bytes)
        .map_err(|e| StoreError::Internal(format!("failed to decode alerts for '{id}': {e}")))
}

impl HistoryStore for SledStore {
    fn get(&self, id: &str) -> Result<Vec<Alert>, StoreError> {
        match self.db.get(id.as_bytes())? {
            Some(value) => decode(id, &value),
            None => Err(StoreError::not_found(id)),
        }
    }

    fn set(&self, id: &str, alerts: &[Alert]) -> Result<(), StoreError> {
        let value = encode(id, alerts)?;
        self.db.insert(id.as_bytes(), value)?;

        tracing::debug!(id, alerts = alerts.len(), "Stored alerts");
        Ok(())
    }

    fn list(&self) -> Result<Vec<MessageEntry>, StoreError> {
        let mut entries = Vec::new();

        for item in self.db.iter() {
            let (key, value) = item?;
            let id = String::from_utf8(key.to_vec()).map_err(|e| {
                StoreError::Internal(format!("stored key is not valid UTF-8: {e}"))
            })?;
            let alerts = decode(&id, &value)?;
            entries.push(MessageEntry { id, alerts });
        }

        tracing::debug!(count = entries.len(), "Listed history");
        Ok(entries)
    }

    fn flush(&self) -> Result<(), StoreError> {
        let bytes = self.db.flush()?;
        tracing::debug!(bytes, "Flushed history database");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sled"
    }
}
