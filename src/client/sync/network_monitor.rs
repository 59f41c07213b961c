//! # Network Monitor
//!
//! Online/offline signal for the session. Status changes are published on a
//! watch channel; they can be fed by hand (tests, the console `online` and
//! `offline` commands) or by a background poller hitting the health endpoint.

use crate::client::api::LedgerApi;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStatus {
    Online,
    Offline,
}

#[derive(Debug, Clone)]
pub struct NetworkMonitor {
    status: Arc<watch::Sender<NetworkStatus>>,
}

impl Default for NetworkMonitor {
    fn default() -> Self {
        Self::new(NetworkStatus::Online)
    }
}

impl NetworkMonitor {
    pub fn new(initial: NetworkStatus) -> Self {
        let (status, _) = watch::channel(initial);
        Self {
            status: Arc::new(status),
        }
    }

    pub fn status(&self) -> NetworkStatus {
        *self.status.borrow()
    }

    pub fn is_online(&self) -> bool {
        self.status() == NetworkStatus::Online
    }

    pub fn subscribe(&self) -> watch::Receiver<NetworkStatus> {
        self.status.subscribe()
    }

    /// Publish a status; returns whether it changed
    pub fn set_status(&self, status: NetworkStatus) -> bool {
        let changed = self.status.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
        if changed {
            tracing::info!("Network status changed to {:?}", status);
        }
        changed
    }

    /// Poll the health endpoint every `every` and publish the result
    ///
    /// Only an unreachable server counts as offline; an error status means
    /// the network itself is up.
    pub fn spawn_poller(&self, api: Arc<dyn LedgerApi>, every: Duration) -> JoinHandle<()> {
        let monitor = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let status = match api.health().await {
                    Err(e) if e.is_unreachable() => NetworkStatus::Offline,
                    _ => NetworkStatus::Online,
                };
                monitor.set_status(status);
            }
        })
    }
}
