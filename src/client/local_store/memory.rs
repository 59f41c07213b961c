//! In-memory pending record store
//!
//! Same contract as the SQLite store without durability. Used by tests and
//! by sessions that opt out of persistence.

use super::LocalStore;
use crate::client::error::StorageError;
use crate::shared::{Record, RecordId};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryLocalStore {
    records: RwLock<HashMap<RecordId, Record>>,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LocalStore for MemoryLocalStore {
    async fn put(&self, record: &Record) -> Result<(), StorageError> {
        self.records.write().await.insert(record.id, record.clone());
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<Record>, StorageError> {
        let mut records: Vec<Record> = self.records.read().await.values().cloned().collect();
        records.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        Ok(records)
    }

    async fn count(&self) -> Result<usize, StorageError> {
        Ok(self.records.read().await.len())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.records.write().await.clear();
        Ok(())
    }
}
