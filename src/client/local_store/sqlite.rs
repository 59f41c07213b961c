//! SQLite-backed pending record store
//!
//! One table, `pending_records`, keyed by record id. The database runs in WAL
//! mode with `synchronous=NORMAL`; a put is durable once it returns.

use super::schema;
use super::LocalStore;
use crate::client::error::StorageError;
use crate::shared::{Record, RecordId};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
    SqliteSynchronous,
};
use sqlx::Row;
use std::path::Path;

/// Pending record store on top of a SQLite connection pool
#[derive(Debug, Clone)]
pub struct SqliteLocalStore {
    pool: SqlitePool,
}

impl SqliteLocalStore {
    /// Open or create the store at `path`
    ///
    /// Creates the parent directory and the schema when missing.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(StorageError::Open)?;

        let store = Self { pool };
        store.init_schema().await?;

        tracing::debug!("Opened local store at {}", path.display());
        Ok(store)
    }

    /// Non-durable store backed by a private in-memory database
    pub async fn in_memory() -> Result<Self, StorageError> {
        // A single connection that never idles out, otherwise the data vanishes
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(StorageError::Open)?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Get connection pool reference
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn init_schema(&self) -> Result<(), StorageError> {
        sqlx::query(schema::CREATE_MIGRATIONS_TABLE)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Open)?;

        let current_version: (i32,) =
            sqlx::query_as("SELECT COALESCE(MAX(version), 0) FROM schema_migrations")
                .fetch_one(&self.pool)
                .await
                .map_err(StorageError::Open)?;

        let version = current_version.0;
        if version > schema::CURRENT_SCHEMA_VERSION {
            return Err(StorageError::Corrupt(format!(
                "schema version {} is newer than supported {}",
                version,
                schema::CURRENT_SCHEMA_VERSION
            )));
        }
        if !schema::needs_migration(version) {
            tracing::debug!("Local store schema at version {}", version);
            return Ok(());
        }

        for migration in schema::pending_migrations(version) {
            self.apply_migration(migration).await?;
        }

        Ok(())
    }

    async fn apply_migration(&self, migration: &schema::Migration) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::Open)?;

        for statement in migration.statements {
            sqlx::query(*statement)
                .execute(&mut *tx)
                .await
                .map_err(StorageError::Open)?;
        }
        sqlx::query("INSERT INTO schema_migrations (version, applied_at) VALUES (?, ?)")
            .bind(migration.version)
            .bind(Utc::now().to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Open)?;

        tx.commit().await.map_err(StorageError::Open)?;
        tracing::info!(
            "Applied local store migration {} ({})",
            migration.version,
            migration.description
        );
        Ok(())
    }

    fn row_to_record(row: &SqliteRow) -> Result<Record, StorageError> {
        let id: String = row.try_get("id")?;
        let timestamp: String = row.try_get("timestamp")?;
        let pending: i64 = row.try_get("pending")?;

        let id = id
            .parse::<RecordId>()
            .map_err(|e| StorageError::Corrupt(format!("bad record id {:?}: {}", id, e)))?;
        let timestamp = DateTime::parse_from_rfc3339(&timestamp)
            .map_err(|e| StorageError::Corrupt(format!("bad timestamp {:?}: {}", timestamp, e)))?
            .with_timezone(&Utc);

        Ok(Record {
            id,
            name: row.try_get("name")?,
            value: row.try_get("value")?,
            timestamp,
            pending: pending != 0,
        })
    }
}

fn encode_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

#[async_trait]
impl LocalStore for SqliteLocalStore {
    async fn put(&self, record: &Record) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT OR REPLACE INTO pending_records (id, name, value, timestamp, pending)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(record.id.to_string())
        .bind(&record.name)
        .bind(record.value)
        .bind(encode_timestamp(&record.timestamp))
        .bind(record.pending)
        .execute(&self.pool)
        .await?;

        tracing::debug!("Stored pending record {}", record.id);
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<Record>, StorageError> {
        let rows = sqlx::query(
            "SELECT id, name, value, timestamp, pending FROM pending_records
             ORDER BY timestamp ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_record).collect()
    }

    async fn count(&self) -> Result<usize, StorageError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pending_records")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0 as usize)
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;
        let removed = sqlx::query("DELETE FROM pending_records")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;

        tracing::debug!("Cleared {} pending records", removed);
        Ok(())
    }
}
