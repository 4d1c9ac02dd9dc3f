//! Service Configuration Module
//!
//! ## Loading Order
//!
//! 1. `ALERT_HISTORY_CONFIG` environment variable (path to TOML file)
//! 2. `alert_history.toml` in the current working directory
//! 3. Built-in defaults (see [`defaults`])
//!
//! Command-line flags are applied on top with [`AppConfig::with_overrides`],
//! then [`AppConfig::validate`] runs once before anything is opened. A bad
//! identifier template stops startup here rather than failing per request.

mod app_config;
pub mod defaults;

pub use app_config::*;
