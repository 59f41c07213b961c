/**
 * Ledger API Client
 *
 * Async HTTP client for the four endpoints the offline subsystem consumes:
 *
 * - `GET  /api/transaction`      - full collection (also the proxy-cached read)
 * - `POST /api/transaction`      - single record; HTTP 200 may carry `errors`
 * - `GET  /api/health`           - liveness probe
 * - `POST /api/transaction/bulk` - every queued record in one call
 *
 * The `LedgerApi` trait is the seam the scheduler and session depend on, so
 * they can run against the HTTP client or an in-process double.
 */
use crate::client::error::ApiError;
use crate::shared::config::ClientConfig;
use crate::shared::{Record, SubmitResponse};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;

const ACCEPT_ANY: &str = "application/json, text/plain, */*";

/// Remote ledger operations used by the page context
#[async_trait]
pub trait LedgerApi: Send + Sync + std::fmt::Debug {
    /// Load the full collection
    async fn list_transactions(&self) -> Result<Vec<Record>, ApiError>;

    /// Submit one record; validation failures come back as `Rejected`
    async fn submit_transaction(&self, record: &Record) -> Result<SubmitResponse, ApiError>;

    /// Lightweight reachability check
    async fn health(&self) -> Result<(), ApiError>;

    /// Submit every queued record at once; only a 2xx counts as success
    async fn submit_bulk(&self, records: &[Record]) -> Result<(), ApiError>;
}

/// `LedgerApi` over HTTP
#[derive(Debug, Clone)]
pub struct HttpLedgerApi {
    config: ClientConfig,
    client: Client,
}

impl HttpLedgerApi {
    /// Build a client using the configured base URL and request timeout
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_ANY));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ApiError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Base URL requests are sent to
    pub fn server_url(&self) -> &str {
        &self.config.server_url
    }
}

#[async_trait]
impl LedgerApi for HttpLedgerApi {
    async fn list_transactions(&self) -> Result<Vec<Record>, ApiError> {
        let url = self.config.api_url("/api/transaction");
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(ApiError::Status(response.status().as_u16()));
        }

        let records = response.json::<Vec<Record>>().await?;
        tracing::debug!("Loaded {} transactions from {}", records.len(), url);
        Ok(records)
    }

    async fn submit_transaction(&self, record: &Record) -> Result<SubmitResponse, ApiError> {
        let url = self.config.api_url("/api/transaction");
        let response = self.client.post(&url).json(record).send().await?;

        // Anything but a 2xx JSON body is treated like an unreachable server
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status().as_u16()));
        }

        Ok(response.json::<SubmitResponse>().await?)
    }

    async fn health(&self) -> Result<(), ApiError> {
        let url = self.config.api_url("/api/health");
        let response = self.client.get(&url).send().await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ApiError::Status(response.status().as_u16()))
        }
    }

    async fn submit_bulk(&self, records: &[Record]) -> Result<(), ApiError> {
        let url = self.config.api_url("/api/transaction/bulk");
        let response = self.client.post(&url).json(records).send().await?;

        if response.status().is_success() {
            tracing::debug!("Bulk submission of {} records accepted", records.len());
            Ok(())
        } else {
            Err(ApiError::Status(response.status().as_u16()))
        }
    }
}
