//! Backend Module
//!
//! A small reference server for the ledger: the transaction API the client
//! submits to, plus the static build assets the proxy provisions. Records
//! live in memory for the lifetime of the process.
//!
//! Only compiled with the `server` feature.
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs       - Module exports
//! ├── error.rs     - Error responses
//! ├── state.rs     - In-memory transaction collection
//! ├── handlers.rs  - Transaction and health handlers
//! └── router.rs    - Route assembly and static files
//! ```

pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use error::BackendError;
pub use router::{api_router, create_router};
pub use state::{AppState, TransactionStore};
