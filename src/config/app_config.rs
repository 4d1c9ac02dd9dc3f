//! Service configuration: TOML file, CLI/env overrides, validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::defaults;
use crate::identifier::{IdGenerator, TemplateError};
use crate::storage::{Backend, StoreConfig};

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config I/O error ({0:?}): {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("config parse error ({0:?}): {1}")]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid id_template: {0}")]
    Template(#[from] TemplateError),
    #[error("config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

// ============================================================================
// AppConfig
// ============================================================================

/// Runtime configuration for the webhook receiver.
///
/// Every key is optional in the TOML file; missing keys take the values in
/// [`defaults`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP bind address (`host:port`)
    pub listen_address: String,
    /// Tracing filter used when `RUST_LOG` is unset
    pub log_level: String,
    /// Template the storage identifier is rendered from
    pub id_template: String,
    /// sled database directory. Unset or empty keeps the database in memory.
    pub db_path: Option<String>,
    pub backend: Backend,
    /// Deadline for graceful shutdown, including the final store flush
    pub shutdown_timeout_secs: u64,
    pub max_body_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_address: defaults::DEFAULT_LISTEN_ADDRESS.to_string(),
            log_level: defaults::DEFAULT_LOG_LEVEL.to_string(),
            id_template: defaults::DEFAULT_ID_TEMPLATE.to_string(),
            db_path: None,
            backend: Backend::default(),
            shutdown_timeout_secs: defaults::DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            max_body_bytes: defaults::DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// Values supplied on the command line or through the environment.
///
/// `None` leaves the file (or default) value in place.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub listen_address: Option<String>,
    pub log_level: Option<String>,
    pub id_template: Option<String>,
    pub db_path: Option<String>,
    pub backend: Option<Backend>,
    pub shutdown_timeout_secs: Option<u64>,
}

impl AppConfig {
    /// Find the config file using the standard search order:
    ///
    /// 1. `ALERT_HISTORY_CONFIG` environment variable (path to TOML file)
    /// 2. `alert_history.toml` in the current working directory
    ///
    /// `None` means built-in defaults apply.
    pub fn locate() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(defaults::CONFIG_ENV_VAR) {
            return Some(PathBuf::from(path));
        }

        let local = PathBuf::from(defaults::LOCAL_CONFIG_FILE);
        local.exists().then_some(local)
    }

    /// Load the file found by [`AppConfig::locate`], or defaults.
    ///
    /// A file that exists but cannot be read or parsed is an error, not a
    /// silent fallback.
    pub fn load() -> Result<Self, ConfigError> {
        Self::locate().map_or_else(|| Ok(Self::default()), |path| Self::load_from_file(&path))
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Apply command-line overrides on top of the loaded values.
    #[must_use]
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(v) = overrides.listen_address {
            self.listen_address = v;
        }
        if let Some(v) = overrides.log_level {
            self.log_level = v;
        }
        if let Some(v) = overrides.id_template {
            self.id_template = v;
        }
        if let Some(v) = overrides.db_path {
            self.db_path = Some(v);
        }
        if let Some(v) = overrides.backend {
            self.backend = v;
        }
        if let Some(v) = overrides.shutdown_timeout_secs {
            self.shutdown_timeout_secs = v;
        }
        self
    }

    /// Validate the configuration.
    ///
    /// A template that does not compile is reported as
    /// [`ConfigError::Template`]; everything else is collected into
    /// [`ConfigError::Validation`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.id_generator()?;

        let mut errors = Vec::new();

        match self.listen_address.rsplit_once(':') {
            Some((_, port)) if port.parse::<u16>().is_ok() => {}
            _ => errors.push(format!(
                "listen_address '{}' must be host:port",
                self.listen_address
            )),
        }
        if tracing_subscriber::EnvFilter::try_new(&self.log_level).is_err() {
            errors.push(format!("log_level '{}' is not a valid filter", self.log_level));
        }
        if self.shutdown_timeout_secs == 0 {
            errors.push("shutdown_timeout_secs must be > 0".to_string());
        }
        if self.max_body_bytes == 0 {
            errors.push("max_body_bytes must be > 0".to_string());
        }
        if self.backend == Backend::Memory && self.store_config().is_durable() {
            tracing::warn!(
                db_path = ?self.db_path,
                "db_path is ignored by the memory backend"
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Compile the identifier template.
    pub fn id_generator(&self) -> Result<IdGenerator, TemplateError> {
        IdGenerator::new(&self.id_template)
    }

    /// How the sled engine should be opened.
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::from_path(self.db_path.as_deref())
    }

    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

// ============================================================================
// Tests
// ============================================================================
