//! Property-based tests

pub mod form_proptest;
