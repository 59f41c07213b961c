//! Integration tests over real HTTP on loopback ports

pub mod api_test;
pub mod offline_sync_test;
pub mod proxy_cache_test;
