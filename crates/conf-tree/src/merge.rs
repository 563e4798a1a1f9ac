//! Deep merge policy
//!
//! Folds an overlay into a base with:
//! - Maps: deep-merge by key, but only when both sides are maps
//! - Lists: REPLACE (overlay wins entirely, no element merge)
//! - Opaque values: REPLACE (never inspected)
//! - Scalars and null: override (overlay wins)

use crate::value::{Map, Value};

/// Deep merge two values.
///
/// Recurses only when both `base` and `overlay` are maps. Every other
/// combination yields `overlay` unchanged.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Map(mut base_map), Value::Map(overlay_map)) => {
            merge_maps(&mut base_map, overlay_map);
            Value::Map(base_map)
        }

        // Lists, opaque instances, scalars, null, and a map over a non-map
        (_, overlay) => overlay,
    }
}

/// Fold `overlay` into `base` in place.
pub fn merge_maps(base: &mut Map, overlay: Map) {
    for (key, overlay_value) in overlay {
        let merged = match base.remove(&key) {
            Some(base_value) => deep_merge(base_value, overlay_value),
            None => overlay_value,
        };
        base.insert(key, merged);
    }
}

/// Merge layers in order (first is base, last has highest precedence).
pub fn merge_layers(layers: Vec<Map>) -> Map {
    layers.into_iter().fold(Map::new(), |mut acc, layer| {
        merge_maps(&mut acc, layer);
        acc
    })
}
