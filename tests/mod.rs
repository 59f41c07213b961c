//! Test suite for the offline ledger
//!
//! This module organizes all tests

pub mod common;
#[cfg(feature = "server")]
pub mod integration;
pub mod property;
