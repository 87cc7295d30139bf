use std::collections::HashMap;
use std::sync::atomic::AtomicU64;

use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;

use super::translate::{COLLECTION_DOCUMENTS, LATENCY_MS, REQUESTS_PER_SECOND};
use super::{ScrapeResult, UP_METRIC};

/// Content type of [`render`]'s output.
pub const CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

type GaugeFamily = Family<Vec<(String, String)>, Gauge<f64, AtomicU64>>;

/// Encodes one scrape's samples as OpenMetrics text.
///
/// A throwaway registry is built per call so nothing outlives the scrape.
/// Families keep the order in which their names first appear.
pub fn render(result: &ScrapeResult) -> Result<String, std::fmt::Error> {
    let mut order: Vec<(&str, GaugeFamily)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for sample in &result.samples {
        let slot = *index.entry(sample.name.as_str()).or_insert_with(|| {
            order.push((sample.name.as_str(), GaugeFamily::default()));
            order.len() - 1
        });
        let labels: Vec<(String, String)> = sample
            .labels
            .iter()
            .map(|(k, v)| (k.clone(), escape_label_value(v)))
            .collect();
        order[slot].1.get_or_create(&labels).set(sample.value);
    }

    let mut registry = Registry::default();
    for (name, family) in order {
        registry.register(name, help(name), family);
    }

    let mut buffer = String::new();
    encode(&mut buffer, &registry)?;
    Ok(buffer)
}

/// Escapes backslash, double quote and newline. The encoder writes label
/// values verbatim, and collection names are arbitrary user strings.
fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn help(name: &str) -> &'static str {
    match name {
        UP_METRIC => "Whether the last fetch of a Typesense endpoint succeeded",
        COLLECTION_DOCUMENTS => "Number of documents in each Typesense collection",
        LATENCY_MS => "Latency in milliseconds by endpoint",
        REQUESTS_PER_SECOND => "Requests per second by endpoint",
        _ => "Typesense metric",
    }
}
