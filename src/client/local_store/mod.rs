//! # Local Store Module
//!
//! Durable storage for records that have not yet been acknowledged by the
//! server. Records put here survive process restarts and stay until a bulk
//! submission succeeds and the store is cleared.
//!
//! ## Key Components
//!
//! - `LocalStore`: the async storage contract the scheduler depends on
//! - `SqliteLocalStore`: SQLite-backed store (WAL mode, schema migrations)
//! - `MemoryLocalStore`: non-durable store for tests and ephemeral sessions
//!
//! ## Usage
//!
//! ```rust,no_run
//! use offline_ledger::client::local_store::{LocalStore, SqliteLocalStore};
//! use offline_ledger::shared::Record;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SqliteLocalStore::open("pending.db").await?;
//! store.put(&Record::new("rent", -500).into_pending()).await?;
//! assert_eq!(store.count().await?, 1);
//! # Ok(())
//! # }
//! ```

pub mod memory;
pub mod schema;
pub mod sqlite;

pub use memory::MemoryLocalStore;
pub use sqlite::SqliteLocalStore;

use crate::client::error::StorageError;
use crate::shared::Record;
use async_trait::async_trait;

/// Durable keyed collection of pending records
///
/// Records are keyed by their `RecordId`; putting a record with an existing
/// id replaces it. Every operation is atomic on its own.
#[async_trait]
pub trait LocalStore: Send + Sync + std::fmt::Debug {
    /// Insert or replace a record
    async fn put(&self, record: &Record) -> Result<(), StorageError>;

    /// Every stored record, oldest timestamp first
    async fn get_all(&self) -> Result<Vec<Record>, StorageError>;

    /// Number of stored records
    async fn count(&self) -> Result<usize, StorageError>;

    /// Remove every record
    async fn clear(&self) -> Result<(), StorageError>;
}
