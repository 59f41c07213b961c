//! Configuration fixtures
//!
//! Every fixture keeps its databases inside the given temporary directory so
//! tests never touch the platform data directory.

use offline_ledger::shared::config::{ClientConfig, ProxyConfig};
use offline_ledger::shared::AppConfig;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Retry interval long enough that no timer fires during a test
pub const QUIET_SYNC_INTERVAL: Duration = Duration::from_secs(600);

/// Client settings pointing at `server_url`
pub fn client_config(server_url: &str, dir: &Path) -> ClientConfig {
    AppConfig::builder()
        .server_url(server_url)
        .sync_interval(QUIET_SYNC_INTERVAL)
        .connectivity_poll(None)
        .db_path(dir.join("pending.db"))
        .build()
        .expect("valid client config")
        .client
}

/// Proxy settings forwarding to `upstream`
pub fn proxy_config(upstream: &str, dir: &Path) -> ProxyConfig {
    AppConfig::builder()
        .upstream_url(upstream)
        .fetch_timeout(Duration::from_secs(2))
        .cache_db_path(dir.join("cache.db"))
        .build()
        .expect("valid proxy config")
        .proxy
}

/// A loopback address nothing is listening on (yet)
pub async fn reserve_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    listener.local_addr().expect("local addr")
}

pub fn http_url(addr: SocketAddr) -> String {
    format!("http://{}", addr)
}
