//! Proxy lifecycle and fallback over real HTTP
//!
//! The reference server sits behind the proxy; once it goes away the proxy
//! answers static assets and the last ledger read from its cache, and
//! refuses writes.

use crate::common::{proxy_config, spawn_backend, spawn_proxy};
use offline_ledger::backend::AppState;
use offline_ledger::proxy::{NetworkProxy, CACHE_FALLBACK_HEADER};
use offline_ledger::shared::config::DEFAULT_STATIC_ASSETS;
use offline_ledger::shared::Record;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_proxy_serves_cache_when_server_goes_away() {
    let dir = tempfile::tempdir().unwrap();
    let state = AppState::new();
    state
        .transactions
        .write()
        .await
        .insert(Record::new("salary", 2000));
    let backend = spawn_backend(state, "127.0.0.1:0".parse().unwrap()).await;

    let config = proxy_config(&backend.url(), dir.path());
    let proxy = NetworkProxy::open(config.clone()).await.unwrap();
    assert!(proxy.start().await);
    assert_eq!(
        proxy
            .cache()
            .entry_count(&config.static_namespace())
            .await
            .unwrap(),
        DEFAULT_STATIC_ASSETS.len()
    );
    let front = spawn_proxy(proxy).await;
    let client = reqwest::Client::new();

    // A live read refreshes the data pool
    let live = client
        .get(format!("{}/api/transaction", front.url()))
        .send()
        .await
        .unwrap();
    assert_eq!(live.status(), 200);
    assert!(live.headers().get(CACHE_FALLBACK_HEADER).is_none());

    backend.stop().await;

    let page = client
        .get(format!("{}/index.html", front.url()))
        .send()
        .await
        .unwrap();
    assert_eq!(page.status(), 200);
    assert_eq!(page.headers()[CACHE_FALLBACK_HEADER], "fallback");
    assert!(page.text().await.unwrap().contains("<title>Ledger</title>"));

    let cached: Vec<Record> = client
        .get(format!("{}/api/transaction", front.url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].name, "salary");

    let write = client
        .post(format!("{}/api/transaction", front.url()))
        .json(&json!({"name": "rent", "value": -500}))
        .send()
        .await
        .unwrap();
    assert_eq!(write.status(), 502);

    front.stop().await;
}

#[tokio::test]
async fn test_failed_install_leaves_proxy_passing_through() {
    let dir = tempfile::tempdir().unwrap();
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/styles.css"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&upstream)
        .await;

    let config = proxy_config(&upstream.uri(), dir.path());
    let proxy = NetworkProxy::open(config.clone()).await.unwrap();

    assert!(!proxy.start().await);
    assert!(!proxy.is_active());
    assert!(proxy.cache().namespaces().await.unwrap().is_empty());

    let front = spawn_proxy(proxy).await;
    let body = reqwest::get(format!("{}/index.html", front.url()))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "ok");

    front.stop().await;
}

#[tokio::test]
async fn test_new_cache_version_drops_old_namespaces() {
    let dir = tempfile::tempdir().unwrap();
    let backend = spawn_backend(AppState::new(), "127.0.0.1:0".parse().unwrap()).await;

    let v1 = proxy_config(&backend.url(), dir.path());
    let first = NetworkProxy::open(v1.clone()).await.unwrap();
    assert!(first.start().await);
    drop(first);

    let mut v2 = v1.clone();
    v2.cache_version += 1;
    let second = NetworkProxy::open(v2.clone()).await.unwrap();
    assert!(second.start().await);

    let mut namespaces = second.cache().namespaces().await.unwrap();
    namespaces.sort();
    let mut expected = vec![v2.data_namespace(), v2.static_namespace()];
    expected.sort();
    assert_eq!(namespaces, expected);

    backend.stop().await;
}
