use axum::{middleware as axum_mw, routing::get, Router};
use std::sync::Arc;

use crate::handlers;
use crate::middleware::timing;
use crate::AppState;

/// Builds the full Axum `Router` with all routes and middleware.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // ── Prometheus scrape target ────────────────────────────
        .route("/metrics", get(handlers::scrape::get_metrics))
        // ── Liveness ────────────────────────────────────────────
        .route("/health", get(handlers::health::health))
        .with_state(state)
        .layer(axum_mw::from_fn(timing::timing_middleware))
}
