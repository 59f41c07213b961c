/**
 * Ledger Session
 *
 * The page-context controller. Owns the shown ledger, the local store, the
 * sync scheduler and the network monitor, and implements the submission
 * path:
 *
 * 1. Validate the form; show "Missing Information" on failure.
 * 2. Show the record at the top of the ledger optimistically.
 * 3. POST it. A 2xx body with `errors` is a rejection; any other 2xx is a
 *    confirmation, after which the proxy's data pool is refreshed and any
 *    earlier backlog is synced. Anything else queues the record locally and
 *    starts a sync.
 *
 * Network events drive the scheduler: online starts it when records are
 * waiting, offline stops it and tells the user how many are waiting.
 */
use crate::client::api::{HttpLedgerApi, LedgerApi};
use crate::client::error::{SessionError, SubmitError, SyncError};
use crate::client::form::TransactionForm;
use crate::client::ledger::{SharedLedger, TransactionLedger};
use crate::client::local_store::{LocalStore, SqliteLocalStore};
use crate::client::notice::{Notice, Notifier};
use crate::client::sync::{NetworkMonitor, NetworkStatus, SyncOutcome, SyncScheduler};
use crate::shared::config::ClientConfig;
use crate::shared::SubmitResponse;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// How a submission ended
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The server stored the record
    Confirmed,
    /// The server refused the record; it stays shown, nothing is queued
    Rejected { errors: serde_json::Value },
    /// The server was unreachable; the record is stored locally
    QueuedOffline,
}

#[derive(Debug, Clone)]
pub struct LedgerSession {
    api: Arc<dyn LedgerApi>,
    store: Arc<dyn LocalStore>,
    ledger: SharedLedger,
    scheduler: SyncScheduler,
    monitor: NetworkMonitor,
    notifier: Notifier,
}

impl LedgerSession {
    /// Open the SQLite store and the HTTP client described by `config`
    pub async fn open(config: &ClientConfig) -> Result<Self, SessionError> {
        let store = SqliteLocalStore::open(config.db_path()).await?;
        let api = HttpLedgerApi::new(config.clone())?;
        Ok(Self::with_parts(config, Arc::new(api), Arc::new(store)))
    }

    /// Assemble a session from existing parts
    pub fn with_parts(
        config: &ClientConfig,
        api: Arc<dyn LedgerApi>,
        store: Arc<dyn LocalStore>,
    ) -> Self {
        let ledger = TransactionLedger::new().shared();
        let notifier = Notifier::new();
        let scheduler = SyncScheduler::new(
            store.clone(),
            api.clone(),
            ledger.clone(),
            notifier.clone(),
            config.sync_interval(),
        );

        Self {
            api,
            store,
            ledger,
            scheduler,
            monitor: NetworkMonitor::default(),
            notifier,
        }
    }

    pub fn scheduler(&self) -> &SyncScheduler {
        &self.scheduler
    }

    pub fn monitor(&self) -> &NetworkMonitor {
        &self.monitor
    }

    pub fn api(&self) -> Arc<dyn LedgerApi> {
        self.api.clone()
    }

    pub fn subscribe_notices(&self) -> broadcast::Receiver<Notice> {
        self.notifier.subscribe()
    }

    /// Copy of the shown ledger
    pub async fn ledger(&self) -> TransactionLedger {
        self.ledger.read().await.clone()
    }

    pub async fn total(&self) -> i64 {
        self.ledger.read().await.total()
    }

    /// Load the collection, show stored records, and sync them if any
    ///
    /// An unreachable server leaves the ledger with the stored records only.
    pub async fn initialize(&self) -> Result<(), SyncError> {
        match self.api.list_transactions().await {
            Ok(records) => {
                tracing::info!("Loaded {} transactions", records.len());
                self.ledger.write().await.replace_all(records);
            }
            Err(e) => tracing::warn!("Could not load transactions: {}", e),
        }

        let pending = match self.store.get_all().await {
            Ok(pending) => pending,
            Err(e) => {
                tracing::error!("Local store failure: {}", e);
                self.notifier.emit(Notice::StorageUnavailable {
                    reason: e.to_string(),
                });
                return Err(SyncError::Storage(e));
            }
        };

        let has_pending = !pending.is_empty();
        if has_pending {
            tracing::info!("{} transactions waiting locally", pending.len());
            self.ledger.write().await.merge_pending(pending);
        }
        self.notifier.emit(Notice::LedgerChanged);

        if !self.monitor.is_online() {
            return self.handle_network_change(NetworkStatus::Offline).await;
        }
        if has_pending {
            self.scheduler.start().await?;
        }
        Ok(())
    }

    /// Validate, show, and submit one transaction
    pub async fn submit(&self, form: TransactionForm) -> Result<SubmitOutcome, SubmitError> {
        let record = match form.into_record() {
            Ok(record) => record,
            Err(e) => {
                self.notifier.emit(Notice::MissingInformation);
                return Err(SubmitError::Validation(e));
            }
        };

        self.notifier.emit(Notice::Cleared);
        self.ledger.write().await.push_front(record.clone());
        self.notifier.emit(Notice::LedgerChanged);

        match self.api.submit_transaction(&record).await {
            Ok(SubmitResponse::Rejected { errors }) => {
                tracing::warn!("Transaction {} rejected: {}", record.id, errors);
                self.notifier.emit(Notice::MissingInformation);
                Ok(SubmitOutcome::Rejected { errors })
            }
            Ok(SubmitResponse::Accepted(_)) => {
                tracing::debug!("Transaction {} confirmed", record.id);
                self.refresh_read_cache();

                // Flush anything queued earlier now that the server answered
                if let Err(e) = self.scheduler.start().await {
                    tracing::error!("Backlog sync after submission failed: {}", e);
                }
                Ok(SubmitOutcome::Confirmed)
            }
            Err(cause) => {
                tracing::info!("Direct submission failed ({}), storing locally", cause);
                self.ledger.write().await.mark_pending(record.id);
                self.notifier.emit(Notice::LedgerChanged);

                self.scheduler
                    .enqueue(record)
                    .await
                    .map_err(|SyncError::Storage(e)| SubmitError::Storage(e))?;
                self.notifier.emit(Notice::StoredLocally);

                if let Err(e) = self.scheduler.start().await {
                    tracing::error!("Sync after queueing failed: {}", e);
                }
                Ok(SubmitOutcome::QueuedOffline)
            }
        }
    }

    /// React to a connectivity change
    pub async fn handle_network_change(&self, status: NetworkStatus) -> Result<(), SyncError> {
        let count = match self.store.count().await {
            Ok(count) => count,
            Err(e) => {
                self.scheduler.stop();
                self.notifier.emit(Notice::StorageUnavailable {
                    reason: e.to_string(),
                });
                return Err(SyncError::Storage(e));
            }
        };

        match status {
            NetworkStatus::Online => {
                if count == 0 {
                    self.notifier.emit(Notice::Cleared);
                } else {
                    let outcome = self.scheduler.start().await?;
                    tracing::debug!("Sync on reconnect: {:?}", outcome);
                }
            }
            NetworkStatus::Offline => {
                self.scheduler.stop();
                if count == 0 {
                    self.notifier.emit(Notice::Cleared);
                } else {
                    self.notifier.emit(Notice::WaitingForNetwork { count });
                }
            }
        }
        Ok(())
    }

    /// Run a sync cycle on demand
    pub async fn sync_now(&self) -> Result<SyncOutcome, SyncError> {
        self.scheduler.start().await
    }

    /// Feed monitor status changes into `handle_network_change`
    pub fn spawn_network_listener(&self) -> JoinHandle<()> {
        let session = self.clone();
        let mut status = self.monitor.subscribe();
        tokio::spawn(async move {
            while status.changed().await.is_ok() {
                let current = *status.borrow_and_update();
                if let Err(e) = session.handle_network_change(current).await {
                    tracing::warn!("Handling {:?} failed: {}", current, e);
                }
            }
        })
    }

    /// Stop background sync
    pub fn shutdown(&self) {
        self.scheduler.stop();
    }

    /// Re-read the collection so the proxy refreshes its data pool
    fn refresh_read_cache(&self) {
        let api = self.api.clone();
        tokio::spawn(async move {
            if let Err(e) = api.list_transactions().await {
                tracing::debug!("Read-cache refresh failed: {}", e);
            }
        });
    }
}
