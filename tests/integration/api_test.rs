//! HTTP client against the reference server

use crate::common::{client_config, spawn_backend};
use assert_matches::assert_matches;
use offline_ledger::backend::AppState;
use offline_ledger::client::{ApiError, HttpLedgerApi, LedgerApi};
use offline_ledger::shared::{Record, SubmitResponse};

async fn api_for(url: &str, dir: &std::path::Path) -> HttpLedgerApi {
    HttpLedgerApi::new(client_config(url, dir)).unwrap()
}

#[tokio::test]
async fn test_submit_and_list_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let server = spawn_backend(AppState::new(), "127.0.0.1:0".parse().unwrap()).await;
    let api = api_for(&server.url(), dir.path()).await;

    let record = Record::new("salary", 2000);
    let response = api.submit_transaction(&record).await.unwrap();
    assert_matches!(response, SubmitResponse::Accepted(_));

    let listed = api.list_transactions().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, record.id);
    assert_eq!(listed[0].value, 2000);
    assert!(!listed[0].pending);

    server.stop().await;
}

#[tokio::test]
async fn test_invalid_submission_reports_errors() {
    let dir = tempfile::tempdir().unwrap();
    let server = spawn_backend(AppState::new(), "127.0.0.1:0".parse().unwrap()).await;
    let api = api_for(&server.url(), dir.path()).await;

    let response = api
        .submit_transaction(&Record::new("   ", 10))
        .await
        .unwrap();
    assert_matches!(response, SubmitResponse::Rejected { errors } => {
        assert!(errors.get("name").is_some());
    });

    server.stop().await;
}

#[tokio::test]
async fn test_bulk_replay_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let state = AppState::new();
    let server = spawn_backend(state.clone(), "127.0.0.1:0".parse().unwrap()).await;
    let api = api_for(&server.url(), dir.path()).await;

    let batch = vec![Record::new("rent", -500), Record::new("coffee", -3)];
    api.submit_bulk(&batch).await.unwrap();
    api.submit_bulk(&batch).await.unwrap();

    assert_eq!(state.transactions.read().await.len(), 2);
    api.health().await.unwrap();

    server.stop().await;
}

#[tokio::test]
async fn test_unreachable_server() {
    let dir = tempfile::tempdir().unwrap();
    let addr = crate::common::reserve_addr().await;
    let api = api_for(&crate::common::http_url(addr), dir.path()).await;

    let err = api.health().await.unwrap_err();
    assert!(err.is_unreachable(), "unexpected error: {:?}", err);
    assert_matches!(err, ApiError::Network(_) | ApiError::Timeout);
}
