//! Deep merge of a freshly generated document into a persisted one.
//!
//! Objects merge key by key with the overlay winning on scalar conflicts.
//! Arrays merge by position: a missing base slot adopts the overlay item, two
//! containers of the same kind merge recursively, anything else is appended
//! unless the base array already holds an equal value. Scalars already in a
//! base array are never replaced, so hand-added entries survive regeneration.

use serde_json::Value;

/// Merge `overlay` into `base` and return the result.
pub fn merge(mut base: Value, overlay: &Value) -> Value {
    merge_into(&mut base, overlay);
    base
}

/// In-place variant of [`merge`].
pub fn merge_into(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(dst), Value::Object(src)) => {
            for (key, item) in src {
                match dst.get_mut(key) {
                    Some(slot) => merge_into(slot, item),
                    None => {
                        dst.insert(key.clone(), item.clone());
                    }
                }
            }
        }
        (Value::Array(dst), Value::Array(src)) => merge_arrays(dst, src),
        (slot, item) => *slot = item.clone(),
    }
}

fn merge_arrays(dst: &mut Vec<Value>, src: &[Value]) {
    // Membership is checked against the base as it was before this merge.
    let original = dst.clone();

    for (index, item) in src.iter().enumerate() {
        match dst.get_mut(index) {
            None => dst.push(item.clone()),
            Some(slot) if same_container(slot, item) => merge_into(slot, item),
            Some(_) => {
                if !original.contains(item) {
                    dst.push(item.clone());
                }
            }
        }
    }
}

fn same_container(a: &Value, b: &Value) -> bool {
    matches!(
        (a, b),
        (Value::Object(_), Value::Object(_)) | (Value::Array(_), Value::Array(_))
    )
}
