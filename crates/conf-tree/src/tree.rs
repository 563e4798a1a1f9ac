//! Path-addressed configuration tree

use std::fmt;

use crate::merge::merge_maps;
use crate::path::KeyPath;
use crate::value::{Map, Value};

/// A configuration tree rooted at a map.
///
/// Mutated only through [`ConfigTree::set`] and [`ConfigTree::merge`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigTree {
    root: Map,
}

impl ConfigTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(root: Map) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Map {
        &self.root
    }

    pub fn into_map(self) -> Map {
        self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Write `value` at `path`, creating intermediate maps as needed.
    ///
    /// Whatever sits at the terminal position is overwritten. An
    /// intermediate that is not a map is replaced by an empty map, except
    /// a list addressed by an existing index.
    pub fn set(&mut self, path: &KeyPath, value: Value) {
        let mut segments = path.segments().iter();
        let Some(first) = segments.next() else {
            return;
        };

        let mut slot = self.root.entry(first.clone()).or_insert(Value::Null);
        for segment in segments {
            slot = child_slot(slot, segment);
        }
        *slot = value;
    }

    /// Walk `path` and return the value stored there, null included.
    pub fn lookup(&self, path: &KeyPath) -> Option<&Value> {
        let mut segments = path.segments().iter();
        let mut node = self.root.get(segments.next()?)?;

        for segment in segments {
            node = match node {
                Value::Map(map) => map.get(segment)?,
                Value::List(items) => items.get(list_index(segment, items.len())?)?,
                _ => return None,
            };
        }

        Some(node)
    }

    /// Fold `other` into this tree; `other` wins on conflicts.
    pub fn merge(&mut self, other: Map) -> &Map {
        merge_maps(&mut self.root, other);
        &self.root
    }

    /// Compact JSON rendering.
    pub fn to_json(&self) -> String {
        self.to_string()
    }

    /// Indented JSON rendering.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.root)
    }
}

impl fmt::Display for ConfigTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(&self.root).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

impl From<Map> for ConfigTree {
    fn from(root: Map) -> Self {
        Self::from_map(root)
    }
}

/// Digits-only segment addressing an existing list element.
fn list_index(segment: &str, len: usize) -> Option<usize> {
    if !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse::<usize>().ok().filter(|index| *index < len)
}

/// Descend one level for writing.
fn child_slot<'a>(node: &'a mut Value, segment: &str) -> &'a mut Value {
    let index = match node {
        Value::List(items) => list_index(segment, items.len()),
        _ => None,
    };

    match (index, node) {
        (Some(index), Value::List(items)) => &mut items[index],
        (_, node) => ensure_map(node)
            .entry(segment.to_string())
            .or_insert(Value::Null),
    }
}

fn ensure_map(node: &mut Value) -> &mut Map {
    if !node.is_map() {
        *node = Value::Map(Map::new());
    }
    match node {
        Value::Map(map) => map,
        _ => unreachable!("node was replaced by a map above"),
    }
}
