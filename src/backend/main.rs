/**
 * Ledger Server Entry Point
 *
 * Serves the transaction API and the static build assets.
 */
use offline_ledger::backend::{create_router, AppState};
use offline_ledger::shared::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .init();

    let config = AppConfig::load()?;
    let addr: std::net::SocketAddr = config.server.listen.parse()?;

    let app = create_router(AppState::new(), &config.server.public_dir);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        "Server listening on {}, static files from {}",
        addr,
        config.server.public_dir.display()
    );
    axum::serve(listener, app).await?;

    Ok(())
}
