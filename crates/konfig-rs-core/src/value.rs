//! Dotted-path addressing and merge helpers for the config value tree.
//!
//! The tree is a `serde_json::Value` whose root is always an object. A key
//! such as `gateways.midtrans.timeout` descends one mapping per segment.

use serde_json::{Map, Value};

/// Split a dotted key into its path segments.
pub fn split_path(key: &str) -> impl Iterator<Item = &str> {
    key.split('.')
}

/// Resolve a dotted key. Reading through a non-mapping intermediate yields `None`.
pub fn get_path<'a>(root: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    let mut segments = split_path(key);
    let first = segments.next()?;
    let mut current = root.get(first)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Whether a dotted key resolves to a value.
pub fn contains_path(root: &Map<String, Value>, key: &str) -> bool {
    get_path(root, key).is_some()
}

/// Write a value at a dotted key, creating empty mappings for missing
/// intermediate segments. A non-mapping intermediate is replaced by a mapping.
pub fn set_path(root: &mut Map<String, Value>, key: &str, value: Value) {
    let segments: Vec<&str> = split_path(key).collect();
    let Some((last, parents)) = segments.split_last() else {
        return;
    };
    let mut current = root;
    for segment in parents {
        let slot = current
            .entry((*segment).to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        let Value::Object(next) = slot else {
            return;
        };
        current = next;
    }
    current.insert((*last).to_string(), value);
}

/// Remove the value at a dotted key, returning it when present.
pub fn remove_path(root: &mut Map<String, Value>, key: &str) -> Option<Value> {
    let segments: Vec<&str> = split_path(key).collect();
    let (last, parents) = segments.split_last()?;
    let mut current = root;
    for segment in parents {
        current = current.get_mut(*segment)?.as_object_mut()?;
    }
    current.remove(*last)
}

/// Merge overlay values into the base, recursively merging mappings.
/// Non-mapping overlay values replace whatever the base holds.
pub fn merge_values(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            merge_maps(base_map, overlay_map);
        }
        (base_slot, overlay_value) => {
            *base_slot = overlay_value.clone();
        }
    }
}

/// Merge an overlay mapping into a base mapping.
pub fn merge_maps(base: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (key, value) in overlay {
        match base.get_mut(key) {
            Some(existing) => merge_values(existing, value),
            None => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}
