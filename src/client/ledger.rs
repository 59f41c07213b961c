//! In-memory transaction ledger
//!
//! The list the user sees: newest record first, each record flagged when it
//! only exists locally. Also derives the total and the running-balance series
//! the chart plots.

use crate::shared::{Record, RecordId};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Ledger shared between the session and the scheduler
pub type SharedLedger = Arc<RwLock<TransactionLedger>>;

/// One point of the running-balance chart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalancePoint {
    /// Date label, `M/D/YYYY`
    pub label: String,
    /// Sum of every record up to and including this one
    pub balance: i64,
}

/// Ordered list of records, newest first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionLedger {
    entries: Vec<Record>,
}

impl TransactionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap into the shared handle
    pub fn shared(self) -> SharedLedger {
        Arc::new(RwLock::new(self))
    }

    /// Replace the contents with the server's collection
    pub fn replace_all(&mut self, mut records: Vec<Record>) {
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        self.entries = records;
    }

    /// Put locally stored records in front of the server's collection
    ///
    /// A record the server already holds under the same id is shown once,
    /// as pending, until the local copy is confirmed.
    pub fn merge_pending(&mut self, mut pending: Vec<Record>) {
        let ids: HashSet<RecordId> = pending.iter().map(|r| r.id).collect();
        self.entries.retain(|r| !ids.contains(&r.id));

        pending.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        for record in pending.iter_mut() {
            record.pending = true;
        }
        pending.append(&mut self.entries);
        self.entries = pending;
    }

    /// Show a record optimistically at the top of the list
    pub fn push_front(&mut self, record: Record) {
        self.entries.insert(0, record);
    }

    /// Flag an already shown record as local-only
    pub fn mark_pending(&mut self, id: RecordId) -> bool {
        match self.entries.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.pending = true;
                true
            }
            None => false,
        }
    }

    /// Clear the pending flag of every record in `ids`
    ///
    /// Returns how many shown records changed.
    pub fn confirm(&mut self, ids: &[RecordId]) -> usize {
        let ids: HashSet<&RecordId> = ids.iter().collect();
        let mut confirmed = 0;
        for record in self.entries.iter_mut().filter(|r| r.pending) {
            if ids.contains(&record.id) {
                record.pending = false;
                confirmed += 1;
            }
        }
        confirmed
    }

    pub fn entries(&self) -> &[Record] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.entries.iter().filter(|r| r.pending).count()
    }

    /// Sum of every value, saturating at the `i64` bounds
    pub fn total(&self) -> i64 {
        self.entries
            .iter()
            .rev()
            .fold(0i64, |sum, r| sum.saturating_add(r.value))
    }

    /// Running balance, oldest record first
    pub fn balance_series(&self) -> Vec<BalancePoint> {
        let mut balance = 0i64;
        self.entries
            .iter()
            .rev()
            .map(|record| {
                balance = balance.saturating_add(record.value);
                BalancePoint {
                    label: record.timestamp.format("%-m/%-d/%Y").to_string(),
                    balance,
                }
            })
            .collect()
    }
}
