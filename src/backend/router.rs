/**
 * Router Configuration
 *
 * API routes first, then static files from the public directory as the
 * fallback (the build assets the proxy provisions into its static pool).
 */
use crate::backend::handlers;
use crate::backend::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use std::path::Path;
use tower_http::services::ServeDir;

/// API routes only
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/transaction",
            get(handlers::list_transactions).post(handlers::create_transaction),
        )
        .route("/api/transaction/bulk", post(handlers::create_bulk))
        .route("/api/health", get(handlers::health))
        .with_state(state)
}

/// API routes plus static files served from `public_dir`
pub fn create_router(state: AppState, public_dir: &Path) -> Router {
    api_router(state).fallback_service(ServeDir::new(public_dir))
}
