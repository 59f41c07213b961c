/**
 * Ledger Proxy Entry Point
 *
 * Starts the caching proxy: installs the static pool, activates, and serves
 * every request on the configured listen address. Until installation has
 * succeeded the proxy forwards every request untouched and retries the
 * install in the background.
 */
use offline_ledger::proxy::NetworkProxy;
use offline_ledger::shared::AppConfig;
use std::time::Duration;

const INSTALL_RETRY: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .init();

    let config = AppConfig::load()?;
    let listen: std::net::SocketAddr = config.proxy.listen.parse()?;

    let proxy = NetworkProxy::open(config.proxy.clone()).await?;
    let installer = proxy.clone();
    tokio::spawn(async move {
        let mut attempts = tokio::time::interval(INSTALL_RETRY);
        loop {
            attempts.tick().await;
            if installer.start().await {
                break;
            }
            tracing::warn!("Proxy running in pass-through mode, retrying install");
        }
    });

    let listener = tokio::net::TcpListener::bind(listen).await?;
    tracing::info!(
        "Proxy listening on {}, upstream {}",
        listen,
        config.proxy.upstream_url
    );
    axum::serve(listener, proxy.router()).await?;

    Ok(())
}
