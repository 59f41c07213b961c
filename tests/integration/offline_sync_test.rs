//! End-to-end offline submission and reconnect
//!
//! The session starts against a port nothing listens on, queues records,
//! and pushes them once the reference server comes up on that port.

use crate::common::{client_config, http_url, reserve_addr, spawn_backend};
use assert_matches::assert_matches;
use offline_ledger::backend::AppState;
use offline_ledger::client::{
    LedgerSession, LocalStore, NetworkStatus, Notice, SqliteLocalStore, SubmitOutcome,
    SyncOutcome, SyncState, TransactionForm,
};
use offline_ledger::shared::Direction;

#[tokio::test]
async fn test_offline_records_reach_server_after_reconnect() {
    let dir = tempfile::tempdir().unwrap();
    let addr = reserve_addr().await;
    let session = crate::assert_ok!(
        LedgerSession::open(&client_config(&http_url(addr), dir.path())).await
    );
    let mut notices = session.subscribe_notices();

    let first = session
        .submit(TransactionForm::new("rent", "500", Direction::Subtract))
        .await
        .unwrap();
    let second = session
        .submit(TransactionForm::new("coffee", "3", Direction::Subtract))
        .await
        .unwrap();
    assert_eq!(first, SubmitOutcome::QueuedOffline);
    assert_eq!(second, SubmitOutcome::QueuedOffline);

    let ledger = session.ledger().await;
    assert_eq!(ledger.pending_count(), 2);
    assert_eq!(ledger.total(), -503);
    assert_eq!(session.scheduler().state(), SyncState::Pending);

    let mut saw_stored = false;
    while let Ok(notice) = notices.try_recv() {
        saw_stored |= notice == Notice::StoredLocally;
    }
    assert!(saw_stored);

    let state = AppState::new();
    let server = spawn_backend(state.clone(), addr).await;

    session
        .handle_network_change(NetworkStatus::Online)
        .await
        .unwrap();

    assert_eq!(state.transactions.read().await.len(), 2);
    assert_eq!(session.ledger().await.pending_count(), 0);
    assert_eq!(session.scheduler().state(), SyncState::Idle);
    assert_matches!(
        session.sync_now().await.unwrap(),
        SyncOutcome::NothingPending
    );

    session.shutdown();
    server.stop().await;
}

#[tokio::test]
async fn test_pending_records_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let addr = reserve_addr().await;
    let config = client_config(&http_url(addr), dir.path());

    {
        let session = LedgerSession::open(&config).await.unwrap();
        session
            .submit(TransactionForm::new("groceries", "42", Direction::Subtract))
            .await
            .unwrap();
        session.shutdown();
    }

    let restarted = LedgerSession::open(&config).await.unwrap();
    restarted.initialize().await.unwrap();

    let ledger = restarted.ledger().await;
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger.pending_count(), 1);
    assert_eq!(ledger.entries()[0].name, "groceries");
    assert_eq!(ledger.total(), -42);
    restarted.shutdown();

    let store = SqliteLocalStore::open(config.db_path()).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_initialize_syncs_backlog_when_server_is_up() {
    let dir = tempfile::tempdir().unwrap();
    let addr = reserve_addr().await;
    let config = client_config(&http_url(addr), dir.path());

    {
        let session = LedgerSession::open(&config).await.unwrap();
        session
            .submit(TransactionForm::new("salary", "2000", Direction::Add))
            .await
            .unwrap();
        session.shutdown();
    }

    let state = AppState::new();
    let server = spawn_backend(state.clone(), addr).await;

    let session = LedgerSession::open(&config).await.unwrap();
    session.initialize().await.unwrap();

    assert_eq!(state.transactions.read().await.len(), 1);
    assert_eq!(session.ledger().await.pending_count(), 0);
    assert_eq!(session.total().await, 2000);

    let store = SqliteLocalStore::open(config.db_path()).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 0);

    session.shutdown();
    server.stop().await;
}
