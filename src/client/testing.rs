//! In-process doubles for the remote API and the local store

use crate::client::api::LedgerApi;
use crate::client::error::{ApiError, StorageError};
use crate::client::local_store::LocalStore;
use crate::shared::{Record, SubmitResponse};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct FakeState {
    online: bool,
    reject_submissions: bool,
    bulk_status: Option<u16>,
    server: Vec<Record>,
    health_calls: usize,
    submit_calls: usize,
    list_calls: usize,
    bulk_calls: Vec<Vec<Record>>,
}

/// Server double with a switchable network
#[derive(Debug, Default)]
pub(crate) struct FakeApi {
    state: Mutex<FakeState>,
    hold_bulk: AtomicBool,
    bulk_gate: Notify,
}

impl FakeApi {
    pub(crate) fn online() -> Arc<Self> {
        let api = Self::default();
        api.state.lock().unwrap().online = true;
        Arc::new(api)
    }

    pub(crate) fn offline() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn set_online(&self, online: bool) {
        self.state.lock().unwrap().online = online;
    }

    pub(crate) fn reject_bulk_with(&self, status: u16) {
        self.state.lock().unwrap().bulk_status = Some(status);
    }

    pub(crate) fn reject_submissions(&self) {
        self.state.lock().unwrap().reject_submissions = true;
    }

    pub(crate) fn seed(&self, records: Vec<Record>) {
        self.state.lock().unwrap().server = records;
    }

    /// Park bulk calls until `release_bulk`
    pub(crate) fn hold_bulk(&self) {
        self.hold_bulk.store(true, Ordering::SeqCst);
    }

    pub(crate) fn release_bulk(&self) {
        self.hold_bulk.store(false, Ordering::SeqCst);
        self.bulk_gate.notify_one();
    }

    pub(crate) fn health_calls(&self) -> usize {
        self.state.lock().unwrap().health_calls
    }

    pub(crate) fn submit_calls(&self) -> usize {
        self.state.lock().unwrap().submit_calls
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.state.lock().unwrap().list_calls
    }

    pub(crate) fn bulk_calls(&self) -> Vec<Vec<Record>> {
        self.state.lock().unwrap().bulk_calls.clone()
    }

    pub(crate) fn server_records(&self) -> Vec<Record> {
        self.state.lock().unwrap().server.clone()
    }

    fn check_online(&self) -> Result<(), ApiError> {
        if self.state.lock().unwrap().online {
            Ok(())
        } else {
            Err(ApiError::Network("connection refused".into()))
        }
    }
}

/// What the server sees after a JSON round trip
fn over_the_wire(record: &Record) -> Record {
    let json = serde_json::to_string(record).unwrap();
    serde_json::from_str(&json).unwrap()
}

#[async_trait]
impl LedgerApi for FakeApi {
    async fn list_transactions(&self) -> Result<Vec<Record>, ApiError> {
        self.state.lock().unwrap().list_calls += 1;
        self.check_online()?;
        let mut records = self.server_records();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(records)
    }

    async fn submit_transaction(&self, record: &Record) -> Result<SubmitResponse, ApiError> {
        self.state.lock().unwrap().submit_calls += 1;
        self.check_online()?;

        let mut state = self.state.lock().unwrap();
        if state.reject_submissions || record.name.is_empty() {
            return Ok(SubmitResponse::Rejected {
                errors: serde_json::json!({"name": {"message": "Name is required"}}),
            });
        }
        let stored = over_the_wire(record);
        state.server.push(stored.clone());
        Ok(SubmitResponse::Accepted(
            serde_json::to_value(&stored).unwrap(),
        ))
    }

    async fn health(&self) -> Result<(), ApiError> {
        self.state.lock().unwrap().health_calls += 1;
        self.check_online()
    }

    async fn submit_bulk(&self, records: &[Record]) -> Result<(), ApiError> {
        self.check_online()?;
        if self.hold_bulk.load(Ordering::SeqCst) {
            self.bulk_gate.notified().await;
        }

        let sent: Vec<Record> = records.iter().map(over_the_wire).collect();
        let mut state = self.state.lock().unwrap();
        state.bulk_calls.push(sent.clone());
        if let Some(status) = state.bulk_status {
            return Err(ApiError::Status(status));
        }
        state.server.extend(sent);
        Ok(())
    }
}

/// Store whose every operation fails
#[derive(Debug)]
pub(crate) struct FailingStore;

#[async_trait]
impl LocalStore for FailingStore {
    async fn put(&self, _record: &Record) -> Result<(), StorageError> {
        Err(StorageError::Corrupt("disk full".into()))
    }

    async fn get_all(&self) -> Result<Vec<Record>, StorageError> {
        Err(StorageError::Corrupt("disk full".into()))
    }

    async fn count(&self) -> Result<usize, StorageError> {
        Err(StorageError::Corrupt("disk full".into()))
    }

    async fn clear(&self) -> Result<(), StorageError> {
        Err(StorageError::Corrupt("disk full".into()))
    }
}
