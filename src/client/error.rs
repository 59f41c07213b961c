//! Client Error Types
//!
//! Errors raised in the page context, one enum per concern:
//!
//! - `ApiError` - a call to the remote API failed (network, timeout, status)
//! - `StorageError` - the local durable store could not open or write
//! - `SyncError` - a sync cycle could not run to completion
//! - `SubmitError` - a user submission could not be accepted locally
//! - `SessionError` - the session could not be assembled
//!
//! Probe and bulk failures are not errors here: the scheduler reports them as
//! `SyncOutcome` values because both are expected, recoverable states.

use crate::shared::SharedError;
use thiserror::Error;

/// Failure of a single call against the remote API
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Transport-level failure (refused, reset, DNS, ...)
    #[error("network error: {0}")]
    Network(String),

    /// The request did not complete within its deadline
    #[error("request timed out")]
    Timeout,

    /// The server answered with a non-success status
    #[error("server responded with status {0}")]
    Status(u16),

    /// The server answered with a body we could not decode
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Whether the failure means the server was not reached at all
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Failure of the local durable store
///
/// Fatal to the offline path: when a record cannot be written it is no
/// longer durable, so callers surface a degraded-storage notice.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The database could not be opened or migrated
    #[error("failed to open local store: {0}")]
    Open(#[source] sqlx::Error),

    /// A read or write was rejected
    #[error("local store operation failed: {0}")]
    Query(#[from] sqlx::Error),

    /// The database directory could not be prepared
    #[error("local store io error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored row could not be turned back into a record
    #[error("corrupt row in local store: {0}")]
    Corrupt(String),
}

/// A sync cycle aborted before reaching a final state
#[derive(Debug, Error)]
pub enum SyncError {
    /// The local store failed mid-cycle
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// A submission could not be accepted locally
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The form was incomplete; nothing was recorded
    #[error(transparent)]
    Validation(#[from] SharedError),

    /// The record could not be queued after the server was unreachable
    #[error("record could not be stored locally: {0}")]
    Storage(#[from] StorageError),
}

/// The session could not be assembled
#[derive(Debug, Error)]
pub enum SessionError {
    /// The local store could not be opened
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The HTTP client could not be built
    #[error(transparent)]
    Api(#[from] ApiError),
}
