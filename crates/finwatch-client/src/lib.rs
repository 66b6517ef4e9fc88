//! finwatch Client - HTTP access to the finance API
//!
//! [`FinanceApi`] is both the monitor's [`DataSource`] (balances and
//! expenses) and its [`Notifier`] (alerts). Clones share one connection pool.
//!
//! # Quick Start
//!
//! ```ignore
//! use finwatch_client::FinanceApi;
//! use finwatch_monitor::{Monitor, MonitorConfig};
//!
//! let api = FinanceApi::connect("http://localhost:8080")?;
//! let mut monitor = Monitor::new(api.clone(), api, MonitorConfig::default());
//! monitor.run().await;
//! ```

use std::sync::Arc;
use std::time::Duration;

use finwatch_monitor::{CollaboratorError, CollaboratorResult, DataSource, Notifier};
use finwatch_types::{Account, AlertEvent, BalancesResponse, Expense, ExpensesResponse};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

// ============================================================================
// Error Types
// ============================================================================

/// Client errors
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Client Result type
pub type ClientResult<T> = std::result::Result<T, ClientError>;

impl From<ClientError> for CollaboratorError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::ApiError { status, message } => CollaboratorError::Status {
                status,
                body: message,
            },
            ClientError::SerializationError(e) => CollaboratorError::Malformed(e.to_string()),
            ClientError::NetworkError(e) if e.is_decode() => {
                CollaboratorError::Malformed(e.to_string())
            }
            other => CollaboratorError::Transport(other.to_string()),
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base address of the finance API
    pub endpoint: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080".to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

// ============================================================================
// Client
// ============================================================================

/// HTTP client for the finance API
#[derive(Clone)]
pub struct FinanceApi {
    config: Arc<ClientConfig>,
    client: Client,
}

impl FinanceApi {
    /// Connect to `endpoint` with default settings
    pub fn connect(endpoint: &str) -> ClientResult<Self> {
        Self::with_config(ClientConfig {
            endpoint: endpoint.to_string(),
            ..Default::default()
        })
    }

    /// Create with custom configuration
    pub fn with_config(config: ClientConfig) -> ClientResult<Self> {
        if config.endpoint.trim().is_empty() {
            return Err(ClientError::ConfigError("endpoint is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::ConfigError(e.to_string()))?;

        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }

    /// `GET /api/balances`
    pub async fn balances(&self) -> ClientResult<Vec<Account>> {
        let resp: BalancesResponse = self.get_json("/api/balances").await?;
        Ok(resp.accounts)
    }

    /// `GET /api/expenses`
    pub async fn expenses(&self) -> ClientResult<Vec<Expense>> {
        let resp: ExpensesResponse = self.get_json("/api/expenses").await?;
        Ok(resp.expenses)
    }

    /// `POST /api/alerts`
    pub async fn post_alert(&self, alert: &AlertEvent) -> ClientResult<()> {
        let url = self.url("/api/alerts");
        let resp = self.client.post(&url).json(alert).send().await?;
        Self::check_status(resp).await?;
        debug!(kind = %alert.kind, "Alert posted");
        Ok(())
    }

    /// Get the endpoint
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// Get the configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.endpoint.trim_end_matches('/'), path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let url = self.url(path);
        let resp = self.client.get(&url).send().await?;
        let resp = Self::check_status(resp).await?;
        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn check_status(resp: Response) -> ClientResult<Response> {
        if !resp.status().is_success() {
            return Err(ClientError::ApiError {
                status: resp.status().as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }
        Ok(resp)
    }
}

#[async_trait::async_trait]
impl DataSource for FinanceApi {
    async fn accounts(&self) -> CollaboratorResult<Vec<Account>> {
        Ok(self.balances().await?)
    }

    async fn expenses(&self) -> CollaboratorResult<Vec<Expense>> {
        Ok(FinanceApi::expenses(self).await?)
    }

    fn name(&self) -> &str {
        self.endpoint()
    }
}

#[async_trait::async_trait]
impl Notifier for FinanceApi {
    async fn send(&self, alert: &AlertEvent) -> CollaboratorResult<()> {
        Ok(self.post_alert(alert).await?)
    }

    fn name(&self) -> &str {
        self.endpoint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_tolerates_trailing_slash() {
        let api = FinanceApi::connect("http://localhost:8080/").unwrap();
        assert_eq!(api.url("/api/balances"), "http://localhost:8080/api/balances");
        assert_eq!(api.config().timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_empty_endpoint_rejected() {
        assert!(matches!(
            FinanceApi::connect("  "),
            Err(ClientError::ConfigError(_))
        ));
    }

    #[test]
    fn test_error_mapping() {
        let status: CollaboratorError = ClientError::ApiError {
            status: 502,
            message: "bad gateway".to_string(),
        }
        .into();
        assert_eq!(
            status,
            CollaboratorError::Status {
                status: 502,
                body: "bad gateway".to_string()
            }
        );

        let decode = serde_json::from_str::<BalancesResponse>("not json").unwrap_err();
        let malformed: CollaboratorError = ClientError::from(decode).into();
        assert!(matches!(malformed, CollaboratorError::Malformed(_)));
    }
}
