//! # Network Proxy
//!
//! Read-path resilience layer between the page context and the server. It
//! runs as its own process and never shares memory with the client; the two
//! only meet on the wire.
//!
//! ## Lifecycle
//!
//! 1. **Install**: fetch every configured static asset and store them in the
//!    static pool in one transaction. Any failure aborts installation and
//!    the proxy stays a plain pass-through.
//! 2. **Activate**: delete every cache namespace other than the current
//!    static and data pools, then start intercepting.
//!
//! ## Per-request policy (when active)
//!
//! - Static asset → fetch with a bounded timeout; 2xx refreshes the static
//!   pool, a failure or timeout serves the cached copy if there is one.
//! - `GET` on the data endpoint → same against the data pool.
//! - Anything else → forwarded untouched.
//!
//! The proxy never mutates application state and never sees the local store.

pub mod cache;
pub mod error;
pub mod policy;

pub use cache::{CacheStorage, CachedResponse, CACHE_FALLBACK_HEADER};
pub use error::ProxyError;
pub use policy::{RequestClass, RoutePolicy};

use crate::shared::config::ProxyConfig;
use axum::body::Bytes;
use axum::extract::{Request, State};
use axum::http::header::{self, HeaderMap, HeaderName};
use axum::http::{Method, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use reqwest::Url;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// A request as it will be sent upstream
#[derive(Debug)]
struct UpstreamRequest {
    method: Method,
    target: Url,
    headers: HeaderMap,
    body: Bytes,
}

impl UpstreamRequest {
    fn get(target: Url) -> Self {
        Self {
            method: Method::GET,
            target,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }
}

struct ProxyInner {
    config: ProxyConfig,
    upstream: Url,
    client: reqwest::Client,
    cache: CacheStorage,
    routes: RoutePolicy,
    active: AtomicBool,
}

/// Caching reverse proxy in front of the ledger server
#[derive(Clone)]
pub struct NetworkProxy {
    inner: Arc<ProxyInner>,
}

impl std::fmt::Debug for NetworkProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkProxy")
            .field("upstream", &self.inner.upstream.as_str())
            .field("active", &self.is_active())
            .finish()
    }
}

impl NetworkProxy {
    /// Open the cache database named in `config` and build the proxy
    pub async fn open(config: ProxyConfig) -> Result<Self, ProxyError> {
        let cache = CacheStorage::open(config.cache_db_path()).await?;
        Self::with_cache(config, cache)
    }

    pub fn with_cache(config: ProxyConfig, cache: CacheStorage) -> Result<Self, ProxyError> {
        let upstream = Url::parse(&config.upstream_url)
            .map_err(|e| ProxyError::InvalidTarget(format!("{}: {}", config.upstream_url, e)))?;
        let routes = RoutePolicy::new(&upstream, &config.static_assets, &config.data_endpoint)?;

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            inner: Arc::new(ProxyInner {
                config,
                upstream,
                client,
                cache,
                routes,
                active: AtomicBool::new(false),
            }),
        })
    }

    pub fn cache(&self) -> &CacheStorage {
        &self.inner.cache
    }

    pub fn is_active(&self) -> bool {
        self.inner.active.load(Ordering::SeqCst)
    }

    /// Provision the static pool; returns the number of assets stored
    pub async fn install(&self) -> Result<usize, ProxyError> {
        let namespace = self.inner.config.static_namespace();
        let fetches = self.inner.routes.asset_urls()?.into_iter().map(|url| async move {
            let key = cache::request_key(&Method::GET, &url);
            let response = self
                .fetch_bounded(UpstreamRequest::get(url.clone()))
                .await
                .map_err(|e| ProxyError::Install {
                    asset: url.to_string(),
                    reason: e.to_string(),
                })?;

            if !response.is_success() {
                return Err(ProxyError::Install {
                    asset: url.to_string(),
                    reason: format!("status {}", response.status),
                });
            }
            Ok::<_, ProxyError>((key, response))
        });
        let fetched = futures_util::future::try_join_all(fetches).await?;

        self.inner.cache.put_all(&namespace, &fetched).await?;
        tracing::info!("Installed {} static assets into {}", fetched.len(), namespace);
        Ok(fetched.len())
    }

    /// Drop stale namespaces and start intercepting; returns what was deleted
    pub async fn activate(&self) -> Result<Vec<String>, ProxyError> {
        let keep = [
            self.inner.config.static_namespace(),
            self.inner.config.data_namespace(),
        ];

        let mut deleted = Vec::new();
        for namespace in self.inner.cache.namespaces().await? {
            if !keep.contains(&namespace) {
                self.inner.cache.delete_namespace(&namespace).await?;
                tracing::info!("Deleted stale cache namespace {}", namespace);
                deleted.push(namespace);
            }
        }
        for namespace in &keep {
            self.inner.cache.open_namespace(namespace).await?;
        }

        self.inner.active.store(true, Ordering::SeqCst);
        tracing::info!("Proxy active in front of {}", self.inner.upstream);
        Ok(deleted)
    }

    /// Install then activate; a failed install leaves the proxy passive
    pub async fn start(&self) -> bool {
        match self.install().await {
            Ok(_) => match self.activate().await {
                Ok(_) => true,
                Err(e) => {
                    tracing::error!("Proxy activation failed: {}", e);
                    false
                }
            },
            Err(e) => {
                tracing::error!("Proxy installation failed, passing requests through: {}", e);
                false
            }
        }
    }

    /// Serve one request
    pub async fn handle(&self, request: Request) -> Response {
        match self.dispatch(request).await {
            Ok(response) => response.into_response(),
            Err(e) => {
                tracing::warn!("Proxy request failed: {}", e);
                e.into_response()
            }
        }
    }

    /// Router sending every request through `handle`
    pub fn router(&self) -> Router {
        Router::new()
            .fallback(proxy_handler)
            .with_state(self.clone())
    }

    async fn dispatch(&self, request: Request) -> Result<CachedResponse, ProxyError> {
        let (parts, body) = request.into_parts();
        let target = self.resolve_target(&parts.uri)?;
        let body = axum::body::to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(|e| ProxyError::Body(e.to_string()))?;

        let request = UpstreamRequest {
            method: parts.method,
            target,
            headers: parts.headers,
            body,
        };

        let class = if self.is_active() {
            self.inner.routes.classify(&request.method, &request.target)
        } else {
            RequestClass::PassThrough
        };
        tracing::debug!("{} {} -> {:?}", request.method, request.target, class);

        match class {
            RequestClass::StaticAsset => {
                let namespace = self.inner.config.static_namespace();
                self.fetch_with_fallback(&namespace, request).await
            }
            RequestClass::DataRead => {
                let namespace = self.inner.config.data_namespace();
                self.fetch_with_fallback(&namespace, request).await
            }
            RequestClass::PassThrough => self.forward(request).await,
        }
    }

    /// Network first; refresh on 2xx, serve the cached copy on failure
    async fn fetch_with_fallback(
        &self,
        namespace: &str,
        request: UpstreamRequest,
    ) -> Result<CachedResponse, ProxyError> {
        let key = cache::request_key(&request.method, &request.target);

        match self.fetch_bounded(request).await {
            Ok(response) => {
                if response.is_success() {
                    if let Err(e) = self.inner.cache.put(namespace, &key, &response).await {
                        tracing::warn!("Could not refresh {} in {}: {}", key, namespace, e);
                    }
                }
                Ok(response)
            }
            Err(failure) => match self.inner.cache.lookup(namespace, &key).await {
                Ok(Some(cached)) => {
                    tracing::info!("Serving cached {} after upstream failure: {}", key, failure);
                    Ok(cached.into_fallback())
                }
                Ok(None) => Err(failure),
                Err(e) => {
                    tracing::warn!("Cache lookup for {} failed: {}", key, e);
                    Err(failure)
                }
            },
        }
    }

    async fn fetch_bounded(&self, request: UpstreamRequest) -> Result<CachedResponse, ProxyError> {
        match tokio::time::timeout(self.inner.config.fetch_timeout(), self.forward(request)).await {
            Ok(result) => result,
            Err(_) => Err(ProxyError::Timeout),
        }
    }

    async fn forward(&self, request: UpstreamRequest) -> Result<CachedResponse, ProxyError> {
        let mut builder = self
            .inner
            .client
            .request(request.method, request.target);

        for (name, value) in request.headers.iter() {
            if !is_hop_by_hop(name) && name != header::HOST && name != header::CONTENT_LENGTH {
                builder = builder.header(name, value);
            }
        }

        let response = builder.body(request.body).send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter(|(name, _)| !is_hop_by_hop(name) && *name != header::CONTENT_LENGTH)
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await?;

        Ok(CachedResponse {
            status,
            headers,
            body,
        })
    }

    fn resolve_target(&self, uri: &Uri) -> Result<Url, ProxyError> {
        if uri.scheme().is_some() {
            return Url::parse(&uri.to_string())
                .map_err(|e| ProxyError::InvalidTarget(format!("{}: {}", uri, e)));
        }

        let path = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
        self.inner
            .upstream
            .join(path)
            .map_err(|e| ProxyError::InvalidTarget(format!("{}: {}", path, e)))
    }
}

async fn proxy_handler(State(proxy): State<NetworkProxy>, request: Request) -> Response {
    proxy.handle(request).await
}

fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "proxy-connection"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    )
}
