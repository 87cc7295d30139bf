use axum::{extract::State, http::header, response::IntoResponse};
use std::sync::Arc;

use crate::metrics::exposition::{self, CONTENT_TYPE};
use crate::AppState;

use super::AppError;

// ─── GET /metrics ────────────────────────────────────────────────
/// Runs a full collection pass against the cluster and renders it.
/// Nothing is cached: every scrape is a fresh round trip upstream.
pub async fn get_metrics(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let result = state.collector.collect().await;
    let body = exposition::render(&result)?;

    Ok(([(header::CONTENT_TYPE, CONTENT_TYPE)], body))
}
