//! Application configuration module
//!
//! One `AppConfig` covers the three processes (client, proxy, reference
//! server). Every field has a default; values come from an optional TOML file
//! named by `LEDGER_CONFIG` and are then overridden by environment variables.
//!
//! ```toml
//! [client]
//! server_url = "http://127.0.0.1:8080"
//! sync_interval_ms = 5000
//!
//! [proxy]
//! listen = "127.0.0.1:8080"
//! upstream_url = "http://127.0.0.1:3000"
//! fetch_timeout_ms = 2000
//!
//! [server]
//! listen = "127.0.0.1:3000"
//! ```

use reqwest::Url;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable naming the TOML config file
pub const CONFIG_FILE_ENV: &str = "LEDGER_CONFIG";

const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";
const DEFAULT_UPSTREAM_URL: &str = "http://127.0.0.1:3000";
const DEFAULT_PROXY_LISTEN: &str = "127.0.0.1:8080";
const DEFAULT_SERVER_LISTEN: &str = "127.0.0.1:3000";

/// Build assets provisioned into the static pool at install time
pub const DEFAULT_STATIC_ASSETS: &[&str] = &[
    "/",
    "/index.html",
    "/styles.css",
    "/index.js",
    "/icons/icon-192x192.png",
    "/icons/icon-512x512.png",
];

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Page-context settings
    pub client: ClientConfig,
    /// Caching proxy settings
    pub proxy: ProxyConfig,
    /// Reference server settings
    pub server: ServerConfig,
}

/// Settings for the ledger client (the page context)
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL every API call goes to (normally the proxy)
    pub server_url: String,
    /// Fixed delay before re-attempting a sync after a failed probe
    pub sync_interval_ms: u64,
    /// Per-request timeout for API calls
    pub request_timeout_ms: u64,
    /// How often to poll connectivity; 0 disables polling
    pub connectivity_poll_ms: u64,
    /// Location of the pending-records database
    pub db_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            sync_interval_ms: 5000,
            request_timeout_ms: 10_000,
            connectivity_poll_ms: 10_000,
            db_path: None,
        }
    }
}

impl ClientConfig {
    /// Get the full URL for an API endpoint
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.server_url.trim_end_matches('/'), path)
    }

    /// Retry interval as a `Duration`
    pub fn sync_interval(&self) -> Duration {
        Duration::from_millis(self.sync_interval_ms)
    }

    /// Request timeout as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Connectivity poll interval, `None` when disabled
    pub fn connectivity_poll(&self) -> Option<Duration> {
        (self.connectivity_poll_ms > 0).then(|| Duration::from_millis(self.connectivity_poll_ms))
    }

    /// Database file path
    ///
    /// Falls back to the platform data directory when not configured.
    pub fn db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| data_dir().join("pending.db"))
    }
}

/// Settings for the caching proxy
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProxyConfig {
    /// Address the proxy listens on
    pub listen: String,
    /// Origin requests are forwarded to
    pub upstream_url: String,
    /// Bound on every upstream fetch the proxy makes
    pub fetch_timeout_ms: u64,
    /// Version suffix of the cache namespaces
    pub cache_version: u32,
    /// Location of the cache database
    pub cache_db_path: Option<PathBuf>,
    /// Paths (or absolute URLs) provisioned into the static pool
    pub static_assets: Vec<String>,
    /// The single collection-read endpoint cached in the data pool
    pub data_endpoint: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_PROXY_LISTEN.to_string(),
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            fetch_timeout_ms: 2000,
            cache_version: 1,
            cache_db_path: None,
            static_assets: DEFAULT_STATIC_ASSETS.iter().map(|s| s.to_string()).collect(),
            data_endpoint: "/api/transaction".to_string(),
        }
    }
}

impl ProxyConfig {
    /// Fetch timeout as a `Duration`
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Cache database file path
    pub fn cache_db_path(&self) -> PathBuf {
        self.cache_db_path
            .clone()
            .unwrap_or_else(|| data_dir().join("proxy-cache.db"))
    }

    /// Name of the static pool namespace
    pub fn static_namespace(&self) -> String {
        format!("static-v{}", self.cache_version)
    }

    /// Name of the data pool namespace
    pub fn data_namespace(&self) -> String {
        format!("data-v{}", self.cache_version)
    }
}

/// Settings for the reference server
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the server listens on
    pub listen: String,
    /// Directory holding the static build assets
    pub public_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_SERVER_LISTEN.to_string(),
            public_dir: PathBuf::from("public"),
        }
    }
}

fn data_dir() -> PathBuf {
    let mut path = dirs::data_dir().unwrap_or_else(std::env::temp_dir);
    path.push("offline-ledger");
    path
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Load configuration from `LEDGER_CONFIG` (if set) and the environment
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_FILE_ENV) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw)
    }

    /// Parse TOML text
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply `LEDGER_*` environment overrides
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(url) = std::env::var("LEDGER_SERVER_URL") {
            self.client.server_url = url;
        }
        if let Ok(interval) = std::env::var("LEDGER_SYNC_INTERVAL_MS") {
            self.client.sync_interval_ms = interval
                .parse()
                .map_err(|_| ConfigError::InvalidValue("LEDGER_SYNC_INTERVAL_MS", interval))?;
        }
        if let Ok(path) = std::env::var("LEDGER_DB_PATH") {
            self.client.db_path = Some(PathBuf::from(path));
        }
        if let Ok(listen) = std::env::var("LEDGER_PROXY_LISTEN") {
            self.proxy.listen = listen;
        }
        if let Ok(upstream) = std::env::var("LEDGER_PROXY_UPSTREAM") {
            self.proxy.upstream_url = upstream;
        }
        if let Ok(listen) = std::env::var("LEDGER_SERVER_LISTEN") {
            self.server.listen = listen;
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.client.server_url)
            .map_err(|_| ConfigError::InvalidUrl(self.client.server_url.clone()))?;
        Url::parse(&self.proxy.upstream_url)
            .map_err(|_| ConfigError::InvalidUrl(self.proxy.upstream_url.clone()))?;
        for listen in [&self.proxy.listen, &self.server.listen] {
            listen
                .parse::<SocketAddr>()
                .map_err(|_| ConfigError::InvalidValue("listen", listen.clone()))?;
        }
        if self.client.sync_interval_ms == 0 {
            return Err(ConfigError::MissingValue("client.sync_interval_ms"));
        }
        if self.proxy.fetch_timeout_ms == 0 {
            return Err(ConfigError::MissingValue("proxy.fetch_timeout_ms"));
        }
        Ok(())
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    /// Set the server URL the client talks to
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.config.client.server_url = url.into();
        self
    }

    /// Set the retry interval
    pub fn sync_interval(mut self, interval: Duration) -> Self {
        self.config.client.sync_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Set the client database path
    pub fn db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.client.db_path = Some(path.into());
        self
    }

    /// Disable or set the connectivity poll interval
    pub fn connectivity_poll(mut self, interval: Option<Duration>) -> Self {
        self.config.client.connectivity_poll_ms =
            interval.map(|d| d.as_millis() as u64).unwrap_or(0);
        self
    }

    /// Set the proxy upstream URL
    pub fn upstream_url(mut self, url: impl Into<String>) -> Self {
        self.config.proxy.upstream_url = url.into();
        self
    }

    /// Set the proxy fetch timeout
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.config.proxy.fetch_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Replace the static asset list
    pub fn static_assets<I, S>(mut self, assets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.proxy.static_assets = assets.into_iter().map(Into::into).collect();
        self
    }

    /// Set the cache namespace version
    pub fn cache_version(mut self, version: u32) -> Self {
        self.config.proxy.cache_version = version;
        self
    }

    /// Set the proxy cache database path
    pub fn cache_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.proxy.cache_db_path = Some(path.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
