pub mod health;
pub mod scrape;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

// ─── Unified error type ──────────────────────────────────────────

/// Failures that reach the HTTP layer. Upstream errors never do: they are
/// folded into `typesense_up` gauges by the collector.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("failed to encode metrics: {0}")]
    Encode(#[from] std::fmt::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "request failed");
        let status = match self {
            Self::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
