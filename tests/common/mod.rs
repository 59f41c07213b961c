//! Common test utilities and helpers
//!
//! - Configuration fixtures rooted in a temporary directory
//! - Reference server and proxy harnesses on loopback ports
//! - Custom assertion macros

pub mod assertions;
pub mod fixtures;
#[cfg(feature = "server")]
pub mod servers;

pub use fixtures::*;
#[cfg(feature = "server")]
pub use servers::*;
