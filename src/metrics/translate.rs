use serde_json::Value;

use super::coerce::{coerce, coerce_document, scalar};
use super::sanitize::sanitize;
use super::{Endpoint, Labels, Sample, UP_METRIC};
use crate::config::Node;

/// Per-collection document count family.
pub const COLLECTION_DOCUMENTS: &str = "typesense_collection_documents";

/// Per-route latency family built from the `latency_ms` stats map.
pub const LATENCY_MS: &str = "typesense_latency_ms";

/// Per-route throughput family built from the `requests_per_second` stats map.
pub const REQUESTS_PER_SECOND: &str = "typesense_requests_per_second";

/// Stats maps keyed by upstream HTTP route rather than by metric name.
const ROUTE_MAPS: [&str; 2] = ["latency_ms", "requests_per_second"];

/// Families owned by the exporter itself. Generically coerced upstream
/// keys that sanitize to one of these are dropped.
const RESERVED: [&str; 4] = [UP_METRIC, COLLECTION_DOCUMENTS, LATENCY_MS, REQUESTS_PER_SECOND];

/// Maps one upstream document to samples, every one labeled with its
/// source node. Unexpected shapes are dropped field by field; this never
/// fails.
pub fn translate(endpoint: Endpoint, doc: &Value, node: &Node) -> Vec<Sample> {
    let labels = node_labels(node);
    match endpoint {
        Endpoint::Metrics | Endpoint::Debug => without_reserved(coerce_document(doc, &labels)),
        Endpoint::Stats => translate_stats(doc, &labels),
        Endpoint::Collections => translate_collections(doc, &labels),
    }
}

fn node_labels(node: &Node) -> Labels {
    Labels::from([("node".to_string(), node.to_string())])
}

fn without_reserved(samples: Vec<Sample>) -> Vec<Sample> {
    samples
        .into_iter()
        .filter(|s| {
            let reserved = RESERVED.contains(&s.name.as_str());
            if reserved {
                tracing::debug!(metric = %s.name, "dropping upstream field that collides with an exporter family");
            }
            !reserved
        })
        .collect()
}

// ─── /stats.json ─────────────────────────────────────────────────

/// `latency_ms` and `requests_per_second` become one family each with an
/// `endpoint` label holding the route, e.g. `endpoint="GET /health"`.
fn translate_stats(doc: &Value, labels: &Labels) -> Vec<Sample> {
    let Value::Object(map) = doc else {
        return without_reserved(coerce_document(doc, labels));
    };

    let mut out = Vec::new();
    for (key, value) in map {
        match value {
            Value::Object(routes) if ROUTE_MAPS.contains(&key.as_str()) => {
                let name = sanitize(key);
                for (route, v) in routes {
                    let Some(v) = scalar(v) else {
                        tracing::trace!(metric = %name, route = %route, "skipping non-numeric route value");
                        continue;
                    };
                    let mut route_labels = labels.clone();
                    route_labels.insert("endpoint".into(), route.clone());
                    out.push(Sample::new(name.clone(), route_labels, v));
                }
            }
            other => {
                let mut generic = Vec::new();
                coerce(&sanitize(key), other, labels, &mut generic);
                out.extend(without_reserved(generic));
            }
        }
    }
    out
}

// ─── /collections ────────────────────────────────────────────────

/// One `typesense_collection_documents{collection=...}` sample per
/// collection descriptor.
fn translate_collections(doc: &Value, labels: &Labels) -> Vec<Sample> {
    let Value::Array(collections) = doc else {
        tracing::trace!("collections response is not an array");
        return Vec::new();
    };

    collections
        .iter()
        .filter_map(Value::as_object)
        .map(|col| {
            let name = col.get("name").and_then(Value::as_str).unwrap_or("unknown");
            let documents = col.get("num_documents").and_then(scalar).unwrap_or(0.0);

            let mut col_labels = labels.clone();
            col_labels.insert("collection".into(), name.to_owned());
            Sample::new(COLLECTION_DOCUMENTS, col_labels, documents)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node() -> Node {
        Node {
            host: "localhost".into(),
            port: 8108,
        }
    }

    fn find<'a>(samples: &'a [Sample], name: &str) -> Vec<&'a Sample> {
        samples.iter().filter(|s| s.name == name).collect()
    }

    fn metrics_json() -> Value {
        json!({
            "system_cpu1_active_percentage": "9.09",
            "system_cpu2_active_percentage": "0.00",
            "system_cpu3_active_percentage": "0.00",
            "system_cpu4_active_percentage": "0.00",
            "system_cpu_active_percentage": "0.00",
            "system_disk_total_bytes": "102888095744",
            "system_disk_used_bytes": "4177268736",
            "system_memory_total_bytes": "16764186624",
            "system_memory_total_swap_bytes": "0",
            "system_memory_used_bytes": "3234148352",
            "system_memory_used_swap_bytes": "0",
            "system_network_received_bytes": "6534814741",
            "system_network_sent_bytes": "4613106962",
            "typesense_memory_active_bytes": "51126272",
            "typesense_memory_allocated_bytes": "43065104",
            "typesense_memory_fragmentation_ratio": "0.16",
            "typesense_memory_mapped_bytes": "97370112",
            "typesense_memory_metadata_bytes": "9009280",
            "typesense_memory_resident_bytes": "51126272",
            "typesense_memory_retained_bytes": "30556160"
        })
    }

    fn stats_json() -> Value {
        json!({
            "delete_latency_ms": 0,
            "delete_requests_per_second": 0,
            "import_latency_ms": 0,
            "import_requests_per_second": 0,
            "latency_ms": {"GET /health": 0.0, "GET /status": 0.0},
            "overloaded_requests_per_second": 0,
            "pending_write_batches": 0,
            "requests_per_second": {"GET /health": 1.5, "GET /status": 0.6},
            "search_latency_ms": 0,
            "search_requests_per_second": 0,
            "total_requests_per_second": 2.1,
            "write_latency_ms": 0,
            "write_requests_per_second": 0
        })
    }

    #[test]
    fn metrics_fields_all_become_samples() {
        let samples = translate(Endpoint::Metrics, &metrics_json(), &node());
        assert_eq!(samples.len(), 20);
        assert!(samples.iter().all(|s| s.labels["node"] == "localhost:8108"));

        let used = find(&samples, "typesense_system_memory_used_bytes");
        assert_eq!(used[0].value, 3_234_148_352.0);
        let ratio = find(&samples, "typesense_memory_fragmentation_ratio");
        assert_eq!(ratio[0].value, 0.16);
    }

    #[test]
    fn stats_route_maps_become_labeled_families() {
        let samples = translate(Endpoint::Stats, &stats_json(), &node());
        assert_eq!(samples.len(), 15);

        let rps = find(&samples, "typesense_requests_per_second");
        assert_eq!(rps.len(), 2);
        assert_eq!(rps[0].labels["endpoint"], "GET /health");
        assert_eq!(rps[0].labels["node"], "localhost:8108");
        assert_eq!(rps[0].value, 1.5);
        assert_eq!(find(&samples, "typesense_latency_ms").len(), 2);

        let total = find(&samples, "typesense_total_requests_per_second");
        assert_eq!(total[0].value, 2.1);
        assert!(!total[0].labels.contains_key("endpoint"));
    }

    #[test]
    fn stats_route_map_skips_non_numeric_values() {
        let doc = json!({"latency_ms": {"GET /a": "slow", "GET /b": 3}});
        let samples = translate(Endpoint::Stats, &doc, &node());
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].labels["endpoint"], "GET /b");
    }

    #[test]
    fn debug_tolerates_text_fields() {
        let doc = json!({"state": 1, "version": "0.24.0"});
        let samples = translate(Endpoint::Debug, &doc, &node());
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].name, "typesense_state");
        assert_eq!(samples[0].value, 1.0);
    }

    #[test]
    fn upstream_keys_cannot_join_exporter_families() {
        let doc = json!({
            "up": 5,
            "collection_documents": 3,
            "typesense_latency_ms": 9,
            "requests_per_second": [1, 2],
            "state": 1
        });
        for endpoint in [Endpoint::Metrics, Endpoint::Debug] {
            let samples = translate(endpoint, &doc, &node());
            let names: Vec<&str> = samples.iter().map(|s| s.name.as_str()).collect();
            assert_eq!(names, vec!["typesense_state"]);
        }
    }

    #[test]
    fn stats_reserved_names_only_come_from_route_maps() {
        let doc = json!({
            "up": 1,
            "latency_ms": 4,
            "requests_per_second": {"GET /health": 1.5},
            "pending_write_batches": 2
        });
        let samples = translate(Endpoint::Stats, &doc, &node());

        assert!(find(&samples, UP_METRIC).is_empty());
        assert!(find(&samples, LATENCY_MS).is_empty());
        let rps = find(&samples, REQUESTS_PER_SECOND);
        assert_eq!(rps.len(), 1);
        assert_eq!(rps[0].labels["endpoint"], "GET /health");
        assert_eq!(find(&samples, "typesense_pending_write_batches").len(), 1);
        assert_eq!(samples.len(), 2);
    }

    #[test]
    fn collections_share_one_metric_name() {
        let doc = json!([
            {"name": "books", "num_documents": 42},
            {"name": "movies", "num_documents": 7}
        ]);
        let samples = translate(Endpoint::Collections, &doc, &node());

        assert_eq!(samples.len(), 2);
        assert!(samples.iter().all(|s| s.name == COLLECTION_DOCUMENTS));
        assert_eq!(samples[0].labels["collection"], "books");
        assert_eq!(samples[0].labels["node"], "localhost:8108");
        assert_eq!(samples[0].value, 42.0);
        assert_eq!(samples[1].labels["collection"], "movies");
        assert_eq!(samples[1].value, 7.0);
    }

    #[test]
    fn collections_fill_in_missing_fields() {
        let doc = json!([{"num_documents": "12"}, {"name": "empty"}, "garbage"]);
        let samples = translate(Endpoint::Collections, &doc, &node());

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].labels["collection"], "unknown");
        assert_eq!(samples[0].value, 12.0);
        assert_eq!(samples[1].labels["collection"], "empty");
        assert_eq!(samples[1].value, 0.0);
    }

    #[test]
    fn unexpected_shapes_yield_nothing() {
        assert!(translate(Endpoint::Collections, &json!({"name": "x"}), &node()).is_empty());
        assert!(translate(Endpoint::Stats, &json!("ok"), &node()).is_empty());
        assert!(translate(Endpoint::Metrics, &Value::Null, &node()).is_empty());
    }
}
