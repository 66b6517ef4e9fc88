//! Worker Configuration
//!
//! Configuration management for the finwatch worker.
//! Supports config files, environment variables, and CLI arguments.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Worker configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Finance API configuration
    #[serde(default)]
    pub api: ApiSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Finance API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base address of the data source and notifier
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ApiSettings {
    /// Get the request timeout duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// =============================================================================
// Default Functions
// =============================================================================

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_request_timeout() -> u64 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

// =============================================================================
// Configuration Loading
// =============================================================================

impl WorkerConfig {
    /// Load configuration from optional config files and the environment
    pub fn load(config_path: Option<&str>) -> anyhow::Result<Self> {
        Self::load_from(config_path, Path::new("config"))
    }

    /// Load with `default`/`local` files looked up in `defaults_dir`
    fn load_from(config_path: Option<&str>, defaults_dir: &Path) -> anyhow::Result<Self> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let mut builder = config::Config::builder()
            .add_source(config::File::from(defaults_dir.join("default")).required(false))
            .add_source(config::File::from(defaults_dir.join("local")).required(false));

        // An explicit file overrides the default locations
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        // Environment variables with FINWATCH_ prefix, e.g. FINWATCH__API__BASE_URL
        builder = builder.add_source(
            config::Environment::with_prefix("FINWATCH")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Reject settings the worker cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        let base = self.api.base_url.trim();
        if base.is_empty() {
            anyhow::bail!("API base URL must not be empty. Set API_BASE or FINWATCH__API__BASE_URL.");
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            anyhow::bail!("API base URL must start with http:// or https://, got {}", base);
        }
        if self.api.request_timeout_secs == 0 {
            anyhow::bail!("Request timeout must be at least one second");
        }
        Ok(())
    }
}
