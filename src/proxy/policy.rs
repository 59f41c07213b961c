//! Request classification
//!
//! Decides which pool, if any, a request belongs to:
//!
//! - **StaticAsset**: a `GET` for one of the configured build assets. Relative
//!   entries match by exact path on the upstream origin; absolute entries
//!   (third-party assets) match by exact URL.
//! - **DataRead**: a `GET` for the collection endpoint on the upstream origin.
//! - **PassThrough**: everything else, including every non-`GET`.

use crate::proxy::error::ProxyError;
use axum::http::Method;
use reqwest::Url;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    StaticAsset,
    DataRead,
    PassThrough,
}

#[derive(Debug, Clone)]
pub struct RoutePolicy {
    upstream: Url,
    static_paths: HashSet<String>,
    static_urls: HashSet<Url>,
    data_endpoint: String,
}

impl RoutePolicy {
    pub fn new(
        upstream: &Url,
        static_assets: &[String],
        data_endpoint: &str,
    ) -> Result<Self, ProxyError> {
        let mut static_paths = HashSet::new();
        let mut static_urls = HashSet::new();

        for asset in static_assets {
            if asset.starts_with('/') {
                static_paths.insert(asset.clone());
            } else {
                let url = Url::parse(asset)
                    .map_err(|e| ProxyError::InvalidTarget(format!("{}: {}", asset, e)))?;
                static_urls.insert(url);
            }
        }

        Ok(Self {
            upstream: upstream.clone(),
            static_paths,
            static_urls,
            data_endpoint: data_endpoint.to_string(),
        })
    }

    pub fn classify(&self, method: &Method, target: &Url) -> RequestClass {
        if method != Method::GET {
            return RequestClass::PassThrough;
        }

        if target.origin() == self.upstream.origin() {
            if self.static_paths.contains(target.path()) {
                return RequestClass::StaticAsset;
            }
            if target.path() == self.data_endpoint {
                return RequestClass::DataRead;
            }
            return RequestClass::PassThrough;
        }

        if self.static_urls.contains(target) {
            RequestClass::StaticAsset
        } else {
            RequestClass::PassThrough
        }
    }

    /// Absolute URL of every static asset, in a stable order
    pub fn asset_urls(&self) -> Result<Vec<Url>, ProxyError> {
        let mut paths: Vec<&String> = self.static_paths.iter().collect();
        paths.sort();

        let mut urls = paths
            .into_iter()
            .map(|path| {
                self.upstream
                    .join(path)
                    .map_err(|e| ProxyError::InvalidTarget(format!("{}: {}", path, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut external: Vec<Url> = self.static_urls.iter().cloned().collect();
        external.sort();
        urls.extend(external);
        Ok(urls)
    }
}
