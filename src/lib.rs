//! alert-history: Alertmanager webhook history
//!
//! Receives Alertmanager webhook notifications, stores each notification's
//! alerts under an identifier rendered from a configurable template, and
//! serves them back by identifier or as a full listing.
//!
//! ## Architecture
//!
//! - **Types**: Alertmanager payload model
//! - **Identifier**: template-driven storage key derivation
//! - **Storage**: `HistoryStore` contract with sled and in-memory backends
//! - **Service**: identifier + store composition used by the HTTP layer
//! - **API**: Axum routes for ingestion and lookup

pub mod api;
pub mod config;
pub mod identifier;
pub mod service;
pub mod storage;
pub mod types;

// Re-export configuration
pub use config::{AppConfig, ConfigError};

// Re-export commonly used types
pub use types::{Alert, Message, MessageEntry, MessageResponse};

// Re-export identifier generation
pub use identifier::{IdGenerator, RenderError, TemplateError};

// Re-export storage
pub use storage::{Backend, HistoryStore, InMemoryStore, SledStore, StoreConfig, StoreError};

pub use service::{HistoryService, ServiceError};
