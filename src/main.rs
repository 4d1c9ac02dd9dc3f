//! alert-history - Alertmanager webhook history receiver
//!
//! # Usage
//!
//! ```bash
//! # In-memory sled database, default template
//! cargo run --release
//!
//! # Durable history with a custom identifier template
//! ./alert-history --db-path ./data/history --id-template '{commonLabels.job}-{status}'
//! ```
//!
//! # Environment Variables
//!
//! - `ALERT_HISTORY_CONFIG`: Path to a TOML config file
//! - `ALERT_HISTORY_*`: Per-flag overrides (see `--help`)
//! - `RUST_LOG`: Logging filter (overrides `log_level`)

use anyhow::{Context, Result};
use clap::Parser;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use alert_history::api::{create_app_with_limit, ApiState};
use alert_history::config::{AppConfig, ConfigOverrides};
use alert_history::storage::{self, Backend};
use alert_history::HistoryService;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "alert-history")]
#[command(about = "Records Alertmanager webhook notifications and serves their history")]
#[command(version)]
struct CliArgs {
    /// The network address to listen on
    #[arg(long, env = "ALERT_HISTORY_LISTEN_ADDRESS", value_name = "HOST:PORT")]
    listen_address: Option<String>,

    /// Default log filter, e.g. 'debug', 'info', 'warn', 'error' (RUST_LOG wins)
    #[arg(long, env = "ALERT_HISTORY_LOG_LEVEL")]
    log_level: Option<String>,

    /// The template used to generate the ID for storage
    #[arg(long, env = "ALERT_HISTORY_ID_TEMPLATE")]
    id_template: Option<String>,

    /// Directory of the history database. Empty keeps the database in memory.
    #[arg(long, env = "ALERT_HISTORY_DB_PATH")]
    db_path: Option<String>,

    /// Storage backend
    #[arg(long, value_enum, env = "ALERT_HISTORY_BACKEND")]
    backend: Option<Backend>,

    /// Seconds allowed for draining requests and flushing the store on shutdown
    #[arg(long, env = "ALERT_HISTORY_SHUTDOWN_TIMEOUT_SECS")]
    shutdown_timeout_secs: Option<u64>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

impl CliArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            listen_address: self.listen_address.clone(),
            log_level: self.log_level.clone(),
            id_template: self.id_template.clone(),
            db_path: self.db_path.clone(),
            backend: self.backend,
            shutdown_timeout_secs: self.shutdown_timeout_secs,
        }
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // With tracing-subscriber's `tracing-log` feature, `init()` also installs a
    // `LogTracer`, so sled's `log` records land here.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

/// How the final store flush ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CloseOutcome {
    Closed,
    Failed,
    TimedOut,
}

/// Flush the store once, giving up at `deadline`.
async fn close_store(service: HistoryService, deadline: Instant) -> CloseOutcome {
    let backend = service.backend_name();
    let flush = tokio::task::spawn_blocking(move || service.flush());

    match tokio::time::timeout_at(deadline, flush).await {
        Ok(Ok(Ok(()))) => {
            info!(backend, "History store closed");
            CloseOutcome::Closed
        }
        Ok(Ok(Err(e))) => {
            error!(backend, error = %e, "Failed to flush history store");
            CloseOutcome::Failed
        }
        Ok(Err(e)) => {
            error!(backend, error = %e, "History store flush task panicked");
            CloseOutcome::Failed
        }
        Err(_) => {
            warn!(backend, "History store flush did not finish before the shutdown deadline");
            CloseOutcome::TimedOut
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    let config_path = AppConfig::locate();
    let config = match &config_path {
        Some(path) => AppConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AppConfig::default(),
    }
    .with_overrides(args.overrides());

    if args.print_config {
        println!("{}", config.to_toml()?);
        return Ok(());
    }

    init_logging(&config.log_level);

    match &config_path {
        Some(path) => info!(path = %path.display(), "Loaded config"),
        None => info!("No config file found, using built-in defaults"),
    }

    config.validate().context("Invalid configuration")?;

    // Template problems abort here, never per request.
    let id_generator = config
        .id_generator()
        .context("Invalid identifier template")?;

    let store = storage::open(config.backend, &config.store_config())
        .context("Failed to initialise database")?;
    let service = HistoryService::new(store, id_generator);

    let app = create_app_with_limit(ApiState::new(service.clone()), config.max_body_bytes);

    let listener = tokio::net::TcpListener::bind(&config.listen_address)
        .await
        .with_context(|| format!("Failed to bind to {}", config.listen_address))?;

    info!(
        address = %config.listen_address,
        backend = service.backend_name(),
        id_template = %service.id_generator(),
        "Server starting"
    );

    // Graceful shutdown via Ctrl+C / SIGTERM
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Interrupt received, shutting down gracefully");
        shutdown_token.cancel();
    });

    let serve_token = cancel_token.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { serve_token.cancelled().await })
            .await
    });

    let timeout = config.shutdown_timeout();
    let (result, deadline) = tokio::select! {
        joined = &mut server => (joined, Instant::now() + timeout),
        () = cancel_token.cancelled() => {
            let deadline = Instant::now() + timeout;
            match tokio::time::timeout_at(deadline, &mut server).await {
                Ok(joined) => (joined, deadline),
                Err(_) => {
                    warn!(?timeout, "HTTP server did not drain before the shutdown deadline");
                    server.abort();
                    (Ok(Ok(())), deadline)
                }
            }
        }
    };

    let outcome = close_store(service, deadline).await;
    tracing::debug!(?outcome, "Store close finished");

    let served = result.context("HTTP server task panicked")?;
    served.context("HTTP server error")?;

    info!("exiting...");
    Ok(())
}
