//! finwatch Worker
//!
//! Polls the finance API every 10 seconds, evaluates the alert rules and
//! posts newly due alerts back to the API. Dedupe state lives in memory only;
//! a restart lets each currently due alert fire once more.
//!
//! # Usage
//!
//! ```bash
//! # Poll the default API at http://localhost:8080
//! finwatch-worker
//!
//! # Point at another API
//! API_BASE=http://api:8080 finwatch-worker
//!
//! # Run a single pass and exit
//! finwatch-worker --once
//! ```

mod config;

use clap::Parser;
use tokio::signal;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use finwatch_client::{ClientConfig, FinanceApi};
use finwatch_monitor::{Monitor, MonitorConfig, POLL_INTERVAL};

use crate::config::{LoggingConfig, WorkerConfig};

// =============================================================================
// CLI Arguments
// =============================================================================

/// finwatch worker - rent, payroll and spending alerts
#[derive(Parser, Debug)]
#[command(name = "finwatch-worker")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (TOML, JSON, or YAML)
    #[arg(short, long, env = "FINWATCH_CONFIG")]
    config: Option<String>,

    /// Base address of the finance API
    #[arg(long, env = "API_BASE")]
    api_base: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "FINWATCH_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format (json, pretty)
    #[arg(long, env = "FINWATCH_LOG_FORMAT")]
    log_format: Option<String>,

    /// Run a single pass and exit
    #[arg(long)]
    once: bool,
}

// =============================================================================
// Main Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut worker_config = WorkerConfig::load(args.config.as_deref())?;

    // Override with CLI arguments
    if let Some(api_base) = args.api_base {
        worker_config.api.base_url = api_base;
    }
    if let Some(level) = args.log_level {
        worker_config.logging.level = level;
    }
    if let Some(format) = args.log_format {
        worker_config.logging.format = format;
    }

    init_logging(&worker_config.logging)?;
    worker_config.validate()?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        api_base = %worker_config.api.base_url,
        interval_secs = POLL_INTERVAL.as_secs(),
        "Starting finwatch worker"
    );

    let api = FinanceApi::with_config(ClientConfig {
        endpoint: worker_config.api.base_url.clone(),
        timeout: worker_config.api.request_timeout(),
    })?;

    let monitor_config = MonitorConfig {
        io_timeout: worker_config.api.request_timeout(),
        ..Default::default()
    };
    let mut monitor = Monitor::new(api.clone(), api, monitor_config);

    if args.once {
        let report = monitor.run_pass().await?;
        tracing::info!(
            fired = report.fired,
            delivered = report.delivered,
            "Single pass complete"
        );
        return Ok(());
    }

    monitor.run_until(shutdown_signal()).await;

    tracing::info!("Worker shutdown complete");

    Ok(())
}

// =============================================================================
// Initialization Functions
// =============================================================================

/// Initialize tracing/logging
fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => {
            subscriber
                .with(fmt::layer().json().with_target(true))
                .try_init()?;
        }
        _ => {
            subscriber
                .with(fmt::layer().pretty().with_target(true))
                .try_init()?;
        }
    }

    Ok(())
}

// =============================================================================
// Graceful Shutdown
// =============================================================================

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, stopping after the current pass...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, stopping after the current pass...");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let args = Args::parse_from([
            "finwatch-worker",
            "--api-base",
            "http://api:8080",
            "--once",
        ]);
        assert_eq!(args.api_base.as_deref(), Some("http://api:8080"));
        assert!(args.once);
        assert!(args.config.is_none());
    }
}
