use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::Value;

use super::translate::translate;
use super::ScrapeResult;
use crate::config::{Config, Target};
use crate::typesense_client::UpstreamError;

// ─── Upstream seam ───────────────────────────────────────────────

/// Source of raw JSON documents for a scrape target.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn fetch(&self, target: &Target) -> Result<Value, UpstreamError>;
}

// ─── Collector ───────────────────────────────────────────────────

/// Runs one full fetch-and-translate pass per scrape.
///
/// Holds nothing mutable: overlapping scrapes each get their own
/// [`ScrapeResult`] and share only the read-only config and the client.
pub struct Collector<U> {
    upstream: U,
    config: Arc<Config>,
}

impl<U: Upstream> Collector<U> {
    pub fn new(upstream: U, config: Arc<Config>) -> Self {
        Self { upstream, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fetches every target concurrently and merges the outcomes back in
    /// target order. A failed target contributes `typesense_up{...} 0`
    /// and nothing else; it never aborts the scrape.
    ///
    /// Dropping the returned future abandons all in-flight fetches.
    pub async fn collect(&self) -> ScrapeResult {
        let started = Instant::now();

        let fetches = self.config.targets.iter().map(|target| async move {
            let outcome = self.upstream.fetch(target).await;
            (target, outcome)
        });
        let outcomes = join_all(fetches).await;

        let mut result = ScrapeResult::default();
        for (target, outcome) in outcomes {
            let node = target.node.to_string();
            match outcome {
                Ok(doc) => {
                    result.record_target(&node, target.endpoint, true);
                    result.extend_samples(translate(target.endpoint, &doc, &target.node));
                }
                Err(err) => {
                    tracing::warn!(
                        node = %err.node,
                        endpoint = %err.endpoint,
                        cause = %err.cause,
                        "upstream fetch failed"
                    );
                    result.record_target(&node, target.endpoint, false);
                }
            }
        }

        tracing::debug!(
            targets = result.targets.len(),
            up = result.up_count(),
            failed = ?result.failed_targets(),
            samples = result.samples.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "scrape complete"
        );
        result
    }
}
