//! Reference server and proxy harnesses

use offline_ledger::backend::{create_router, AppState};
use offline_ledger::proxy::NetworkProxy;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A running HTTP server that can be shut down on demand
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop accepting, close idle connections and wait for the server to exit
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        let _ = self.handle.await;
    }
}

fn serve(listener: tokio::net::TcpListener, app: axum::Router) -> TestServer {
    let addr = listener.local_addr().expect("local addr");
    let (tx, rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = rx.await;
            })
            .await
            .expect("server error");
    });
    TestServer {
        addr,
        shutdown: Some(tx),
        handle,
    }
}

/// Directory holding the static build assets
pub fn public_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("public")
}

/// Start the reference server on `addr` (port 0 for an ephemeral one)
pub async fn spawn_backend(state: AppState, addr: SocketAddr) -> TestServer {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("bind backend");
    serve(listener, create_router(state, &public_dir()))
}

/// Serve `proxy` on an ephemeral loopback port
pub async fn spawn_proxy(proxy: NetworkProxy) -> TestServer {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind proxy");
    serve(listener, proxy.router())
}
