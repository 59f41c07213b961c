//! # Ledger Client
//!
//! The page context of the offline-resilient ledger: it shows the ledger,
//! submits new transactions, keeps unsent ones in a durable local store and
//! pushes them to the server once it is reachable again.
//!
//! ## Architecture
//!
//! - **Session**: submission path and network event handling
//! - **Local Store**: durable pending records (SQLite)
//! - **Sync**: retry scheduler and network monitor
//! - **API**: HTTP client for the ledger endpoints
//! - **Ledger**: the shown list, its total and running balance
//! - **Notices**: status messages for whatever front end is attached
//!
//! ## Usage
//!
//! ```rust,no_run
//! use offline_ledger::client::{LedgerSession, TransactionForm};
//! use offline_ledger::shared::{AppConfig, Direction};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load()?;
//! let session = LedgerSession::open(&config.client).await?;
//! session.initialize().await?;
//!
//! let outcome = session
//!     .submit(TransactionForm::new("rent", "500", Direction::Subtract))
//!     .await?;
//! println!("{:?}, balance {}", outcome, session.total().await);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod error;
pub mod form;
pub mod ledger;
pub mod local_store;
pub mod notice;
pub mod session;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{HttpLedgerApi, LedgerApi};
pub use error::{ApiError, SessionError, StorageError, SubmitError, SyncError};
pub use form::TransactionForm;
pub use ledger::{BalancePoint, SharedLedger, TransactionLedger};
pub use local_store::{LocalStore, MemoryLocalStore, SqliteLocalStore};
pub use notice::{Notice, Notifier};
pub use session::{LedgerSession, SubmitOutcome};
pub use sync::{NetworkMonitor, NetworkStatus, SyncOutcome, SyncScheduler, SyncState};
