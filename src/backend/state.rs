//! In-memory transaction collection shared by the handlers

use crate::shared::{Record, RecordId};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct TransactionStore {
    records: Vec<Record>,
    ids: HashSet<RecordId>,
}

impl TransactionStore {
    /// Insert unless the id is already stored; returns whether it was added
    pub fn insert(&mut self, record: Record) -> bool {
        if !self.ids.insert(record.id) {
            return false;
        }
        self.records.push(record);
        true
    }

    /// Every record, newest first
    pub fn newest_first(&self) -> Vec<Record> {
        let mut records = self.records.clone();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// State handed to every handler
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub transactions: Arc<RwLock<TransactionStore>>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }
}
