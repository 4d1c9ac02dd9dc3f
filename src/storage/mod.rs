//! Alert History Storage
//!
//! A uniform key-value contract, [`HistoryStore`], over two interchangeable
//! backends:
//! - [`SledStore`]: sled-backed, durable on disk or temporary in memory
//! - [`InMemoryStore`]: concurrent map for tests and "no durability" deployments
//!
//! Each identifier maps to exactly one alert sequence. A `set` replaces the
//! previous sequence for that identifier; nothing is merged.

pub mod memory;
pub mod sled_store;

pub use memory::InMemoryStore;
pub use sled_store::SledStore;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::types::{Alert, MessageEntry};

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No alerts were ever stored under this identifier.
    #[error("no history for id '{id}'")]
    NotFound { id: String },
    /// Encoding, decoding or engine failure. Never retried.
    #[error("internal storage error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// History store contract shared by every backend.
///
/// Implementations must be thread-safe (Send + Sync); the store is shared by
/// all request handlers. Every call is synchronous and bounded: `get` and
/// `set` touch one key, `list` is proportional to the number of entries.
pub trait HistoryStore: Send + Sync {
    /// Alerts most recently stored under `id`, or [`StoreError::NotFound`].
    fn get(&self, id: &str) -> Result<Vec<Alert>, StoreError>;

    /// Store `alerts` under `id`, replacing any previous value atomically.
    fn set(&self, id: &str, alerts: &[Alert]) -> Result<(), StoreError>;

    /// Every entry currently stored. Order is unspecified.
    fn list(&self) -> Result<Vec<MessageEntry>, StoreError>;

    /// Persist outstanding writes. A no-op for non-durable backends.
    fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Which [`HistoryStore`] implementation to run.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// sled, durable when a path is configured
    #[default]
    Sled,
    /// Concurrent map, lost on exit
    Memory,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sled => f.write_str("sled"),
            Self::Memory => f.write_str("memory"),
        }
    }
}

/// How the sled engine is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    /// On-disk database directory, survives restarts.
    Durable { path: PathBuf },
    /// Temporary database, removed when the handle is dropped.
    Ephemeral,
}

impl StoreConfig {
    /// `None` or an empty path selects [`StoreConfig::Ephemeral`].
    pub fn from_path(path: Option<&str>) -> Self {
        match path.map(str::trim) {
            Some(p) if !p.is_empty() => Self::Durable { path: PathBuf::from(p) },
            _ => Self::Ephemeral,
        }
    }

    pub const fn is_durable(&self) -> bool {
        matches!(self, Self::Durable { .. })
    }
}

/// Open the configured backend.
///
/// `config` is only consulted for [`Backend::Sled`].
pub fn open(backend: Backend, config: &StoreConfig) -> Result<Arc<dyn HistoryStore>, StoreError> {
    let store: Arc<dyn HistoryStore> = match backend {
        Backend::Sled => Arc::new(SledStore::open(config)?),
        Backend::Memory => Arc::new(InMemoryStore::new()),
    };
    tracing::info!(backend = store.backend_name(), "History store ready");
    Ok(store)
}
