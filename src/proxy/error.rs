/**
 * Proxy Error Types
 *
 * Errors raised while forwarding or serving a request. Every variant maps to
 * an HTTP status so handlers can return them directly; the response body is
 * JSON:
 *
 * ```json
 * {
 *   "error": "upstream request timed out",
 *   "status": 504
 * }
 * ```
 */
use axum::{
    body::Body,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyError {
    /// The upstream could not be reached
    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    /// The upstream did not answer within the fetch timeout
    #[error("upstream request timed out")]
    Timeout,

    /// A static asset could not be provisioned
    #[error("failed to install {asset}: {reason}")]
    Install { asset: String, reason: String },

    /// The cache database failed
    #[error("cache storage error: {0}")]
    Cache(#[from] sqlx::Error),

    /// The cache directory could not be prepared
    #[error("cache storage io error: {0}")]
    Io(#[from] std::io::Error),

    /// A cached entry could not be decoded
    #[error("corrupt cache entry: {0}")]
    Corrupt(String),

    /// The request URI could not be resolved against the upstream
    #[error("invalid request target: {0}")]
    InvalidTarget(String),

    /// The request body could not be read
    #[error("failed to read request body: {0}")]
    Body(String),
}

impl ProxyError {
    /// HTTP status reported to the caller
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ProxyError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::InvalidTarget(_) | ProxyError::Body(_) => StatusCode::BAD_REQUEST,
            ProxyError::Install { .. }
            | ProxyError::Cache(_)
            | ProxyError::Io(_)
            | ProxyError::Corrupt(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        Response::builder()
            .status(status)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap_or_else(|_| status.into_response())
    }
}
