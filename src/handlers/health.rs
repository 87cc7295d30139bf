use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    /// Number of Typesense nodes scraped per request
    pub nodes: usize,
}

// ─── GET /health ─────────────────────────────────────────────────
/// Liveness only; does not touch the cluster.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        nodes: state.collector.config().nodes.len(),
    })
}
