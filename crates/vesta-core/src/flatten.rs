//! Record flattening for tabular encodings.

use serde_json::{Map, Value};

/// Rewrites a nested record as a single-level mapping.
///
/// Object fields become dot-joined keys (`observation.co2`), array elements
/// become index-joined keys (`coordinates.0`). Keys appear in document order,
/// which is what fixes CSV column order. Null values and empty containers
/// contribute no key, so they render as missing cells downstream.
pub fn flatten(record: &Value) -> Map<String, Value> {
    let mut out = Map::new();
    flatten_into(record, None, &mut out);
    out
}

fn flatten_into(node: &Value, prefix: Option<&str>, out: &mut Map<String, Value>) {
    match node {
        Value::Object(fields) => {
            for (key, value) in fields {
                let joined = match prefix {
                    Some(p) => format!("{}.{}", p, key),
                    None => key.clone(),
                };
                flatten_into(value, Some(&joined), out);
            }
        }
        Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                let joined = match prefix {
                    Some(p) => format!("{}.{}", p, index),
                    None => index.to_string(),
                };
                flatten_into(value, Some(&joined), out);
            }
        }
        Value::Null => {}
        scalar => {
            out.insert(prefix.unwrap_or_default().to_string(), scalar.clone());
        }
    }
}
