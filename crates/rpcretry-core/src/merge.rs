//! Recursive merge of JSON documents, used to layer client-config overrides.
//!
//! Right-hand keys win. Objects present on both sides merge recursively;
//! anything else (arrays included) is replaced wholesale.

use serde_json::{Map, Value};

/// Merge `right` into `left`.
pub fn merge_values(left: &mut Value, right: Value) {
    match (left, right) {
        (Value::Object(l), Value::Object(r)) => merge_maps(l, r),
        (l, r) => *l = r,
    }
}

fn merge_maps(left: &mut Map<String, Value>, right: Map<String, Value>) {
    for (key, value) in right {
        match left.get_mut(&key) {
            Some(existing) if existing.is_object() && value.is_object() => {
                merge_values(existing, value);
            }
            Some(existing) => *existing = value,
            None => {
                left.insert(key, value);
            }
        }
    }
}

/// Fold `docs` left to right. Returns `Value::Null` for an empty input.
pub fn merge_all<I>(docs: I) -> Value
where
    I: IntoIterator<Item = Value>,
{
    let mut iter = docs.into_iter();
    let mut acc = match iter.next() {
        Some(first) => first,
        None => return Value::Null,
    };
    for doc in iter {
        merge_values(&mut acc, doc);
    }
    acc
}
