//! System-wide default constants.
//!
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Server
// ============================================================================

/// HTTP server bind address.
pub const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0:8080";

/// Largest webhook body accepted (bytes).
///
/// Alertmanager truncates notifications past `max_alerts`, so 1 MiB leaves
/// plenty of headroom.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Deadline for draining HTTP connections and flushing the store on shutdown (seconds).
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 20;

// ============================================================================
// Identifiers
// ============================================================================

/// Alert group name followed by the receiver, e.g. `Test_webhook`.
pub const DEFAULT_ID_TEMPLATE: &str = "{groupLabels.alertname}_{receiver}";

// ============================================================================
// Logging
// ============================================================================

/// Tracing filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// ============================================================================
// Config discovery
// ============================================================================

/// Environment variable naming a TOML config file.
pub const CONFIG_ENV_VAR: &str = "ALERT_HISTORY_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "alert_history.toml";
