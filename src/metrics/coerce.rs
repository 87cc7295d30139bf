use serde_json::Value;

use super::sanitize::{join, sanitize};
use super::{Labels, Sample};

/// Field that identifies an element in an array of objects.
const IDENTITY_FIELD: &str = "name";

/// Label used for positional array elements.
const INDEX_LABEL: &str = "index";

// ─── Public entry points ─────────────────────────────────────────

/// Flattens a whole upstream document into samples.
///
/// Only objects carry named fields; any other root shape yields nothing.
pub fn coerce_document(doc: &Value, labels: &Labels) -> Vec<Sample> {
    let mut out = Vec::new();
    match doc {
        Value::Object(map) => {
            for (key, value) in map {
                coerce(&sanitize(key), value, labels, &mut out);
            }
        }
        other => {
            tracing::trace!(kind = kind(other), "skipping non-object document root");
        }
    }
    out
}

/// Converts one JSON value found under `name` into zero or more samples.
///
/// * numbers map to themselves, booleans to 1.0 / 0.0
/// * strings are kept only if they parse as a float
/// * objects recurse with the child key appended to the name
/// * arrays keep the name and move identity into a label: `name` for
///   objects carrying a string `name` field, `index` otherwise
/// * null, nested arrays and non-numeric strings are skipped
pub fn coerce(name: &str, value: &Value, labels: &Labels, out: &mut Vec<Sample>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                coerce(&join(name, key), child, labels, out);
            }
        }
        Value::Array(items) => coerce_array(name, items, labels, out),
        Value::Null => {}
        leaf => match scalar(leaf) {
            Some(v) => out.push(Sample::new(name, labels.clone(), v)),
            None => tracing::trace!(metric = name, kind = kind(leaf), "skipping non-numeric leaf"),
        },
    }
}

/// Numeric reading of a leaf value, if it has one.
pub fn scalar(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// ─── Arrays ──────────────────────────────────────────────────────

fn coerce_array(name: &str, items: &[Value], labels: &Labels, out: &mut Vec<Sample>) {
    for (i, item) in items.iter().enumerate() {
        match item {
            Value::Array(_) => {
                tracing::trace!(metric = name, index = i, "skipping nested array");
            }
            Value::Object(map) => {
                let identity = map.get(IDENTITY_FIELD).and_then(Value::as_str);
                let element_labels = match identity {
                    Some(id) => with_label(labels, IDENTITY_FIELD, id),
                    None => with_label(labels, INDEX_LABEL, &i.to_string()),
                };
                let Some(element_labels) = element_labels else {
                    tracing::trace!(metric = name, index = i, "label already bound, skipping element");
                    continue;
                };
                for (key, child) in map {
                    if identity.is_some() && key == IDENTITY_FIELD {
                        continue;
                    }
                    coerce(&join(name, key), child, &element_labels, out);
                }
            }
            leaf => match with_label(labels, INDEX_LABEL, &i.to_string()) {
                Some(element_labels) => coerce(name, leaf, &element_labels, out),
                None => tracing::trace!(metric = name, index = i, "label already bound, skipping element"),
            },
        }
    }
}

/// Copies `labels` with one more pair, refusing to overwrite.
fn with_label(labels: &Labels, key: &str, value: &str) -> Option<Labels> {
    if labels.contains_key(key) {
        return None;
    }
    let mut next = labels.clone();
    next.insert(key.to_owned(), value.to_owned());
    Some(next)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
