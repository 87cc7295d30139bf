pub mod coerce;
pub mod collector;
pub mod exposition;
pub mod sanitize;
pub mod translate;

use std::collections::{BTreeMap, HashSet};
use std::fmt;

pub use collector::{Collector, Upstream};

/// Label set attached to a sample. Ordered so rendering is deterministic.
pub type Labels = BTreeMap<String, String>;

/// Metric name of the per-target health gauge.
pub const UP_METRIC: &str = "typesense_up";

// ─── Endpoint descriptors ────────────────────────────────────────

/// One upstream JSON resource exposed by every Typesense node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Metrics,
    Stats,
    Debug,
    Collections,
}

impl Endpoint {
    /// Fixed per-node scrape order.
    pub const ALL: [Endpoint; 4] = [
        Endpoint::Metrics,
        Endpoint::Stats,
        Endpoint::Debug,
        Endpoint::Collections,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Metrics => "metrics",
            Self::Stats => "stats",
            Self::Debug => "debug",
            Self::Collections => "collections",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Samples ─────────────────────────────────────────────────────

/// A single observation handed to the exposition layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Namespaced metric name, e.g. "typesense_system_memory_used_bytes"
    pub name: String,
    pub labels: Labels,
    pub value: f64,
}

impl Sample {
    pub fn new(name: impl Into<String>, labels: Labels, value: f64) -> Self {
        Self {
            name: name.into(),
            labels,
            value,
        }
    }
}

/// Outcome of one (node, endpoint) fetch within a scrape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetStatus {
    pub node: String,
    pub endpoint: Endpoint,
    pub up: bool,
}

/// Everything one scrape produced. Built fresh per request and dropped
/// once rendered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapeResult {
    pub samples: Vec<Sample>,
    pub targets: Vec<TargetStatus>,
}

impl ScrapeResult {
    /// Records a fetch outcome and its `typesense_up` gauge.
    pub fn record_target(&mut self, node: &str, endpoint: Endpoint, up: bool) {
        let mut labels = Labels::new();
        labels.insert("endpoint".into(), endpoint.as_str().into());
        labels.insert("node".into(), node.into());
        self.samples
            .push(Sample::new(UP_METRIC, labels, if up { 1.0 } else { 0.0 }));
        self.targets.push(TargetStatus {
            node: node.into(),
            endpoint,
            up,
        });
    }

    /// Appends translated samples, dropping any series already present.
    pub fn extend_samples(&mut self, samples: impl IntoIterator<Item = Sample>) {
        let mut seen: HashSet<(String, Labels)> = self
            .samples
            .iter()
            .map(|s| (s.name.clone(), s.labels.clone()))
            .collect();

        for sample in samples {
            if seen.insert((sample.name.clone(), sample.labels.clone())) {
                self.samples.push(sample);
            } else {
                tracing::debug!(metric = %sample.name, "dropping duplicate series");
            }
        }
    }

    pub fn up_count(&self) -> usize {
        self.targets.iter().filter(|t| t.up).count()
    }

    /// `node/endpoint` of every target that failed this scrape.
    pub fn failed_targets(&self) -> Vec<String> {
        self.targets
            .iter()
            .filter(|t| !t.up)
            .map(|t| format!("{}/{}", t.node, t.endpoint))
            .collect()
    }
}
