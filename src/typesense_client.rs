use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::{ApiKey, Config, Target};
use crate::metrics::{Endpoint, Upstream};

/// Header Typesense reads the API key from.
pub const API_KEY_HEADER: &str = "X-TYPESENSE-API-KEY";

// ─── Errors ──────────────────────────────────────────────────────

/// Why a single (node, endpoint) fetch failed.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamCause {
    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed JSON body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for UpstreamCause {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err)
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("fetching {endpoint} from {node} failed: {cause}")]
pub struct UpstreamError {
    pub node: String,
    pub endpoint: Endpoint,
    #[source]
    pub cause: UpstreamCause,
}

impl UpstreamError {
    pub fn new(target: &Target, cause: impl Into<UpstreamCause>) -> Self {
        Self {
            node: target.node.to_string(),
            endpoint: target.endpoint,
            cause: cause.into(),
        }
    }
}

// ─── Client ──────────────────────────────────────────────────────

/// Pooled HTTP client for the Typesense admin endpoints.
///
/// `reqwest::Client` is an `Arc` internally, so one instance serves every
/// overlapping scrape and keeps connections alive between them.
#[derive(Debug, Clone)]
pub struct TypesenseClient {
    http: reqwest::Client,
    api_key: ApiKey,
}

impl TypesenseClient {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl Upstream for TypesenseClient {
    /// One GET, no retries: the next scrape is the retry.
    async fn fetch(&self, target: &Target) -> Result<Value, UpstreamError> {
        let started = Instant::now();

        let response = self
            .http
            .get(target.url.clone())
            .header(API_KEY_HEADER, self.api_key.expose())
            .send()
            .await
            .map_err(|e| UpstreamError::new(target, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::new(target, UpstreamCause::Status(status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::new(target, e))?;
        let doc = serde_json::from_slice(&body).map_err(|e| UpstreamError::new(target, e))?;

        tracing::debug!(
            node = %target.node,
            endpoint = %target.endpoint,
            bytes = body.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "fetched upstream document"
        );
        Ok(doc)
    }
}
