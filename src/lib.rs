//! Offline Ledger - Main Library
//!
//! A personal ledger that keeps working without a network: transactions
//! entered while the server is unreachable are stored locally and pushed in
//! one bulk call once connectivity returns, and a caching proxy keeps the
//! application shell and the last known ledger available offline.
//!
//! # Module Structure
//!
//! - **`shared`** - Types shared by every part
//!   - The ledger record and its wire format
//!   - Shared error types
//!   - Configuration (file, environment, builder)
//!
//! - **`client`** - The page context
//!   - Submission path and network event handling
//!   - Durable local store for pending records (SQLite)
//!   - Sync scheduler with a single retry timer
//!   - Ledger view: list, total and running balance
//!
//! - **`proxy`** - The network proxy
//!   - Versioned cache namespaces (SQLite)
//!   - Network-first fetching with cache fallback
//!   - Install / activate lifecycle
//!
//! - **`backend`** - Reference server (only compiled with `server` feature)
//!   - Transaction and bulk endpoints
//!   - Static build assets
//!
//! # Feature Flags
//!
//! - **`server`** (default) - the reference backend and its binary
//!
//! # Usage
//!
//! ```rust,no_run
//! use offline_ledger::client::LedgerSession;
//! use offline_ledger::shared::AppConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load()?;
//! let session = LedgerSession::open(&config.client).await?;
//! session.initialize().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! - **Client**: the ledger is an `Arc<RwLock<>>`; one sync cycle runs at a
//!   time and at most one retry timer is armed
//! - **Proxy**: cache access goes through a `sqlx` pool
//! - **Server**: records are held behind an `Arc<RwLock<>>`

/// Shared types and data structures
pub mod shared;

/// Page context: submission, local store, sync
pub mod client;

/// Caching network proxy
pub mod proxy;

/// Reference server
#[cfg(feature = "server")]
pub mod backend;
