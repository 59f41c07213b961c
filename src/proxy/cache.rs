//! # Cache Storage
//!
//! Named response pools in SQLite. Each namespace (`static-v1`, `data-v1`,
//! ...) holds whole responses keyed by `"{METHOD} {URL}"`. Namespaces exist
//! independently of their entries so an activated but still empty pool is
//! kept by cleanup.

use crate::proxy::error::ProxyError;
use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;

/// Response header set when a cached copy is served after an upstream failure
pub const CACHE_FALLBACK_HEADER: &str = "x-ledger-cache";

const CREATE_NAMESPACES: &str = "CREATE TABLE IF NOT EXISTS cache_namespaces (
    name TEXT PRIMARY KEY NOT NULL,
    created_at TEXT NOT NULL
)";

const CREATE_ENTRIES: &str = "CREATE TABLE IF NOT EXISTS cache_entries (
    namespace TEXT NOT NULL,
    request_key TEXT NOT NULL,
    status INTEGER NOT NULL,
    headers TEXT NOT NULL,
    body BLOB NOT NULL,
    stored_at TEXT NOT NULL,
    PRIMARY KEY (namespace, request_key)
)";

/// Cache key for a request
pub fn request_key(method: &Method, url: &reqwest::Url) -> String {
    format!("{} {}", method, url)
}

/// A complete upstream response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl CachedResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Mark the response as served from the cache
    pub fn into_fallback(mut self) -> Self {
        self.headers
            .push((CACHE_FALLBACK_HEADER.to_string(), "fallback".to_string()));
        self
    }

    pub fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::BAD_GATEWAY);

        let headers = response.headers_mut();
        for (name, value) in &self.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                headers.append(name, value);
            }
        }
        response
    }
}

#[derive(Debug, Clone)]
pub struct CacheStorage {
    pool: SqlitePool,
}

impl CacheStorage {
    /// Open or create the cache database at `path`
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, ProxyError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        let storage = Self { pool };
        storage.init_schema().await?;
        tracing::debug!("Opened proxy cache at {}", path.display());
        Ok(storage)
    }

    /// Private in-memory cache
    pub async fn in_memory() -> Result<Self, ProxyError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let storage = Self { pool };
        storage.init_schema().await?;
        Ok(storage)
    }

    async fn init_schema(&self) -> Result<(), ProxyError> {
        sqlx::query(CREATE_NAMESPACES).execute(&self.pool).await?;
        sqlx::query(CREATE_ENTRIES).execute(&self.pool).await?;
        Ok(())
    }

    /// Create a namespace if missing
    pub async fn open_namespace(&self, namespace: &str) -> Result<(), ProxyError> {
        sqlx::query("INSERT OR IGNORE INTO cache_namespaces (name, created_at) VALUES (?, ?)")
            .bind(namespace)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Names of every namespace
    pub async fn namespaces(&self) -> Result<Vec<String>, ProxyError> {
        let rows = sqlx::query("SELECT name FROM cache_namespaces ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| row.try_get::<String, _>("name").map_err(ProxyError::from))
            .collect()
    }

    /// Drop a namespace and its entries
    pub async fn delete_namespace(&self, namespace: &str) -> Result<(), ProxyError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM cache_entries WHERE namespace = ?")
            .bind(namespace)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM cache_namespaces WHERE name = ?")
            .bind(namespace)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    /// Store one response, replacing any previous one for the key
    pub async fn put(
        &self,
        namespace: &str,
        key: &str,
        response: &CachedResponse,
    ) -> Result<(), ProxyError> {
        let entry = [(key.to_string(), response.clone())];
        self.put_all(namespace, &entry).await
    }

    /// Store several responses in a single transaction
    pub async fn put_all(
        &self,
        namespace: &str,
        entries: &[(String, CachedResponse)],
    ) -> Result<(), ProxyError> {
        let stored_at = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT OR IGNORE INTO cache_namespaces (name, created_at) VALUES (?, ?)")
            .bind(namespace)
            .bind(&stored_at)
            .execute(&mut *tx)
            .await?;

        for (key, response) in entries {
            let headers = serde_json::to_string(&response.headers)
                .map_err(|e| ProxyError::Corrupt(e.to_string()))?;
            sqlx::query(
                "INSERT OR REPLACE INTO cache_entries
                 (namespace, request_key, status, headers, body, stored_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(namespace)
            .bind(key)
            .bind(i64::from(response.status))
            .bind(headers)
            .bind(response.body.as_ref())
            .bind(&stored_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Cached response for `key`, if any
    pub async fn lookup(
        &self,
        namespace: &str,
        key: &str,
    ) -> Result<Option<CachedResponse>, ProxyError> {
        let row = sqlx::query(
            "SELECT status, headers, body FROM cache_entries
             WHERE namespace = ? AND request_key = ?",
        )
        .bind(namespace)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let status: i64 = row.try_get("status")?;
        let headers: String = row.try_get("headers")?;
        let body: Vec<u8> = row.try_get("body")?;

        Ok(Some(CachedResponse {
            status: u16::try_from(status)
                .map_err(|_| ProxyError::Corrupt(format!("status {}", status)))?,
            headers: serde_json::from_str(&headers)
                .map_err(|e| ProxyError::Corrupt(e.to_string()))?,
            body: Bytes::from(body),
        }))
    }

    /// Number of entries in a namespace
    pub async fn entry_count(&self, namespace: &str) -> Result<usize, ProxyError> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM cache_entries WHERE namespace = ?")
                .bind(namespace)
                .fetch_one(&self.pool)
                .await?;
        Ok(count.0 as usize)
    }
}
