//! # Sync Scheduler
//!
//! Drains the local store into the server with one bulk call per cycle.
//!
//! A cycle runs: count → (nothing pending: done) → probe `/api/health` →
//! bulk submit every stored record → clear the store → confirm the records in
//! the shown ledger. A failed probe arms a single retry timer and the cycle
//! repeats after a fixed interval, indefinitely, until `stop` is called.
//!
//! ## States
//!
//! - **Idle**: no timer armed, no cycle running
//! - **Pending**: a retry timer is armed
//! - **Syncing**: a cycle is running
//!
//! Cycles are serialized by an async mutex, and `enqueue` writes through the
//! same mutex, so a record stored while a cycle is in flight is never cleared
//! without having been sent. Every `start` and `stop` bumps a cycle counter;
//! a timer only fires if the counter still matches the one it was armed with.

use crate::client::api::LedgerApi;
use crate::client::error::{ApiError, StorageError, SyncError};
use crate::client::ledger::SharedLedger;
use crate::client::local_store::LocalStore;
use crate::client::notice::{Notice, Notifier};
use crate::shared::{Record, RecordId};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Scheduler lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Nothing scheduled
    Idle,
    /// Retry timer armed
    Pending,
    /// Cycle in progress
    Syncing,
}

/// How a sync cycle ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The local store was empty; no network traffic
    NothingPending,
    /// Every stored record was accepted and the store cleared
    Synced { count: usize },
    /// The server was unreachable; another attempt is scheduled
    RetryScheduled { cause: ApiError },
    /// The server refused the bulk call; records stay stored, no retry
    BulkRejected { cause: ApiError },
}

struct RetryTimer {
    cycle: u64,
    handle: JoinHandle<()>,
}

struct Inner {
    store: Arc<dyn LocalStore>,
    api: Arc<dyn LedgerApi>,
    ledger: SharedLedger,
    notifier: Notifier,
    interval: Duration,
    state: watch::Sender<SyncState>,
    cycle: AtomicU64,
    timer: Mutex<Option<RetryTimer>>,
    sync_lock: tokio::sync::Mutex<()>,
}

/// Retry-until-success synchronization of locally stored records
#[derive(Clone)]
pub struct SyncScheduler {
    inner: Arc<Inner>,
}

impl fmt::Debug for SyncScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncScheduler")
            .field("state", &self.state())
            .field("interval", &self.inner.interval)
            .field("cycle", &self.inner.cycle.load(Ordering::SeqCst))
            .finish()
    }
}

impl SyncScheduler {
    /// Create a new sync scheduler
    pub fn new(
        store: Arc<dyn LocalStore>,
        api: Arc<dyn LedgerApi>,
        ledger: SharedLedger,
        notifier: Notifier,
        interval: Duration,
    ) -> Self {
        let (state, _) = watch::channel(SyncState::Idle);
        Self {
            inner: Arc::new(Inner {
                store,
                api,
                ledger,
                notifier,
                interval,
                state,
                cycle: AtomicU64::new(0),
                timer: Mutex::new(None),
                sync_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Current state
    pub fn state(&self) -> SyncState {
        *self.inner.state.borrow()
    }

    /// Watch state transitions
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.inner.state.subscribe()
    }

    /// Fixed delay between retries
    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    /// Store a record durably, ordered against any running cycle
    pub async fn enqueue(&self, record: Record) -> Result<(), SyncError> {
        let _guard = self.inner.sync_lock.lock().await;
        let record = record.into_pending();
        if let Err(e) = self.inner.store.put(&record).await {
            return Err(self.storage_failure(e));
        }
        tracing::info!("Queued record {} for later submission", record.id);
        Ok(())
    }

    /// Run one sync cycle now
    ///
    /// Disarms any armed retry timer first. Waits for a cycle already in
    /// progress, then re-reads the store, so two overlapping calls never
    /// submit the same records twice.
    pub async fn start(&self) -> Result<SyncOutcome, SyncError> {
        let cycle = self.begin_cycle();
        let _guard = self.inner.sync_lock.lock().await;

        let count = match self.inner.store.count().await {
            Ok(count) => count,
            Err(e) => return Err(self.storage_failure(e)),
        };

        if count == 0 {
            tracing::debug!("Sync requested with nothing pending");
            self.set_state(SyncState::Idle);
            return Ok(SyncOutcome::NothingPending);
        }

        self.set_state(SyncState::Syncing);
        tracing::info!("Syncing {} pending records", count);

        let records = match self.inner.store.get_all().await {
            Ok(records) => records,
            Err(e) => return Err(self.storage_failure(e)),
        };

        if let Err(cause) = self.inner.api.health().await {
            return Ok(self.schedule_retry(cycle, cause));
        }

        if let Err(cause) = self.inner.api.submit_bulk(&records).await {
            if cause.is_unreachable() {
                return Ok(self.schedule_retry(cycle, cause));
            }
            tracing::error!("Bulk submission rejected: {}", cause);
            self.set_state(SyncState::Idle);
            return Ok(SyncOutcome::BulkRejected { cause });
        }

        if let Err(e) = self.inner.store.clear().await {
            return Err(self.storage_failure(e));
        }

        let ids: Vec<RecordId> = records.iter().map(|r| r.id).collect();
        let confirmed = self.inner.ledger.write().await.confirm(&ids);

        self.set_state(SyncState::Idle);
        tracing::info!(
            "Synced {} records ({} shown records confirmed)",
            records.len(),
            confirmed
        );
        self.inner.notifier.emit(Notice::LedgerChanged);
        self.inner.notifier.emit(Notice::Submitted {
            count: records.len(),
        });

        Ok(SyncOutcome::Synced {
            count: records.len(),
        })
    }

    /// Disarm the retry timer and go idle; safe to call repeatedly
    pub fn stop(&self) {
        self.inner.cycle.fetch_add(1, Ordering::SeqCst);
        if let Some(timer) = self.lock_timer().take() {
            timer.handle.abort();
            tracing::debug!("Retry timer disarmed");
        }
        self.set_state(SyncState::Idle);
    }

    fn begin_cycle(&self) -> u64 {
        let cycle = self.inner.cycle.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(timer) = self.lock_timer().take() {
            timer.handle.abort();
        }
        cycle
    }

    fn schedule_retry(&self, cycle: u64, cause: ApiError) -> SyncOutcome {
        let delay = self.inner.interval;
        if self.arm_retry(cycle) {
            tracing::warn!("Server unreachable ({}), retrying in {:?}", cause, delay);
            self.set_state(SyncState::Pending);
            self.inner.notifier.emit(Notice::Retrying { delay });
        } else {
            tracing::debug!("Sync stopped during cycle, not retrying");
            self.set_state(SyncState::Idle);
        }
        SyncOutcome::RetryScheduled { cause }
    }

    /// Arm the single retry timer, unless `stop` or `start` ran since `cycle` began
    fn arm_retry(&self, cycle: u64) -> bool {
        let mut slot = self.lock_timer();
        if self.inner.cycle.load(Ordering::SeqCst) != cycle {
            return false;
        }

        // Deadline counts from arming, not from the task's first poll
        let deadline = tokio::time::Instant::now() + self.inner.interval;
        let scheduler = self.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if !scheduler.claim_timer(cycle) {
                return;
            }
            if let Err(e) = scheduler.start().await {
                tracing::error!("Scheduled sync failed: {}", e);
            }
        });

        *slot = Some(RetryTimer { cycle, handle });
        true
    }

    /// Take the armed timer out of its slot if it is still the current one
    fn claim_timer(&self, cycle: u64) -> bool {
        let mut slot = self.lock_timer();
        match slot.as_ref() {
            Some(timer) if timer.cycle == cycle => {
                slot.take();
                true
            }
            _ => false,
        }
    }

    fn storage_failure(&self, err: StorageError) -> SyncError {
        tracing::error!("Local store failure: {}", err);
        self.set_state(SyncState::Idle);
        self.inner.notifier.emit(Notice::StorageUnavailable {
            reason: err.to_string(),
        });
        SyncError::Storage(err)
    }

    fn set_state(&self, state: SyncState) {
        self.inner.state.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                tracing::trace!(from = ?*current, to = ?state, "sync state");
                *current = state;
                true
            }
        });
    }

    fn lock_timer(&self) -> std::sync::MutexGuard<'_, Option<RetryTimer>> {
        self.inner.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
