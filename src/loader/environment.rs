//! Environment variable snapshot and folding
//!
//! `server__host=localhost` folds to `{"server": {"host": "localhost"}}`.
//! Values stay raw strings.

use conf_tree::{ConfigTree, KeyPath, Map, Value};
use std::collections::BTreeMap;
use tracing::trace;

/// Environment variables captured at one point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvironmentSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the current process environment, skipping non-UTF-8 pairs
    pub fn from_process() -> Self {
        std::env::vars_os()
            .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?)))
            .collect()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvironmentSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Fold a snapshot into a tree nested on `__`.
///
/// Names that would produce an empty segment (`__x`, `a____b`) are skipped.
/// When two names address the same position, the later one in name order
/// wins.
pub fn fold_environment(snapshot: &EnvironmentSnapshot) -> Map {
    let mut tree = ConfigTree::new();

    for (name, value) in snapshot.iter() {
        match KeyPath::from_env_name(name) {
            Ok(path) => tree.set(&path, Value::from(value)),
            Err(e) => trace!(variable = name, error = %e, "Skipping environment variable"),
        }
    }

    tree.into_map()
}
