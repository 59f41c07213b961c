//! Shared Module
//!
//! Types shared by the client, the caching proxy and the reference backend:
//! the ledger record and its wire format, shared errors and configuration.

/// Ledger record and wire types
pub mod record;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use record::{Direction, Record, RecordId, SubmitResponse};
pub use error::SharedError;
pub use config::{AppConfig, AppConfigBuilder, ConfigError};
