//! User-facing status notices
//!
//! The subsystem never renders anything itself; it broadcasts `Notice` values
//! and whatever front end is attached shows them.

use std::fmt;
use std::time::Duration;
use tokio::sync::broadcast;

const NOTICE_CAPACITY: usize = 64;

/// Status line shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Nothing to report; hide the status line
    Cleared,
    /// The form was submitted incomplete or the server refused it
    MissingInformation,
    /// The server could not be reached; the record was kept locally
    StoredLocally,
    /// A sync probe failed and another attempt is scheduled
    Retrying { delay: Duration },
    /// Queued records were accepted by the server
    Submitted { count: usize },
    /// The network is down and records are waiting locally
    WaitingForNetwork { count: usize },
    /// The local store failed; offline records may not be durable
    StorageUnavailable { reason: String },
    /// The shown ledger changed and should be redrawn
    LedgerChanged,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Cleared => Ok(()),
            Notice::MissingInformation => write!(f, "Missing Information"),
            Notice::StoredLocally => write!(
                f,
                "Server unreachable, the transaction stayed locally and will be sent later"
            ),
            Notice::Retrying { delay } => write!(
                f,
                "Server unreachable, retrying in {} seconds",
                delay.as_secs_f64()
            ),
            Notice::Submitted { count } => {
                write!(f, "{} pending transactions sent to the server", count)
            }
            Notice::WaitingForNetwork { count } => write!(
                f,
                "{} transactions not saved to server, waiting for network connection",
                count
            ),
            Notice::StorageUnavailable { reason } => {
                write!(f, "Local storage unavailable: {}", reason)
            }
            Notice::LedgerChanged => Ok(()),
        }
    }
}

/// Broadcast sender for notices
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notice>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(NOTICE_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }

    /// Send a notice; having no listener is fine
    pub fn emit(&self, notice: Notice) {
        tracing::trace!(?notice, "notice");
        let _ = self.tx.send(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waiting_for_network_text() {
        assert_eq!(
            Notice::WaitingForNetwork { count: 3 }.to_string(),
            "3 transactions not saved to server, waiting for network connection"
        );
        assert_eq!(
            Notice::Retrying { delay: Duration::from_millis(5000) }.to_string(),
            "Server unreachable, retrying in 5 seconds"
        );
    }

    #[tokio::test]
    async fn test_emit_without_listener_is_silent() {
        let notifier = Notifier::new();
        notifier.emit(Notice::Cleared);

        let mut rx = notifier.subscribe();
        notifier.emit(Notice::MissingInformation);
        assert_eq!(rx.recv().await.unwrap(), Notice::MissingInformation);
    }
}
