//! # Background Sync
//!
//! Moves locally stored records to the server once it is reachable again.
//!
//! - **Scheduler**: probe, bulk submit, clear, retry on a fixed interval
//! - **Network Monitor**: online/offline signal that starts and stops it

pub mod network_monitor;
pub mod scheduler;

pub use network_monitor::{NetworkMonitor, NetworkStatus};
pub use scheduler::{SyncOutcome, SyncScheduler, SyncState};
