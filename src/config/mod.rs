//! Public configuration object
//!
//! Wraps a [`ConfigTree`] with `:`-key access and the lookup policy:
//! - A present, non-null value is returned as is
//! - A missing or null value falls back to an explicitly supplied default
//! - Otherwise the lookup fails with [`ConfError::MissingKey`]

mod error;
mod source;

pub use error::{ConfError, ErrorKind};
pub use source::{LayerOrigin, LayerSource, Provenance};

use conf_tree::{ConfigTree, KeyPath, Map, PathError, Value};
use std::fmt;

/// Merged configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    tree: ConfigTree,
    provenance: Option<Provenance>,
}

impl Config {
    /// Start from an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing tree
    pub fn from_map(map: Map) -> Self {
        Self {
            tree: ConfigTree::from_map(map),
            provenance: None,
        }
    }

    /// Wrap a JSON object
    pub fn from_json(json: serde_json::Value) -> Result<Self, ConfError> {
        match Value::from(json) {
            Value::Map(map) => Ok(Self::from_map(map)),
            _ => Err(ConfError::invalid_argument(
                "Configuration must be built from a JSON object",
            )),
        }
    }

    /// Write `value` at `key`, overwriting whatever was there
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<(), ConfError> {
        let path = parse_key(key, "Cannot set undefined key in configuration")?;
        self.tree.set(&path, value.into());
        Ok(())
    }

    /// Look up a required value
    pub fn get(&self, key: &str) -> Result<&Value, ConfError> {
        self.get_opt(key)?.ok_or_else(|| ConfError::MissingKey {
            key: key.to_string(),
        })
    }

    /// Look up a value, returning `default` when it is missing or null.
    ///
    /// A `Value::Null` default is honored like any other default.
    pub fn get_or(&self, key: &str, default: impl Into<Value>) -> Result<Value, ConfError> {
        match self.get_opt(key)? {
            Some(value) => Ok(value.clone()),
            None => Ok(default.into()),
        }
    }

    /// Look up a value; null leaves count as missing.
    pub fn get_opt(&self, key: &str) -> Result<Option<&Value>, ConfError> {
        let path = parse_key(key, "Cannot lookup undefined key in configuration")?;
        Ok(self.tree.lookup(&path).filter(|value| !value.is_null()))
    }

    /// Fold `other` into this configuration; `other` wins on conflicts
    pub fn merge(&mut self, other: Map) -> &Map {
        self.tree.merge(other)
    }

    pub fn tree(&self) -> &ConfigTree {
        &self.tree
    }

    pub fn into_tree(self) -> ConfigTree {
        self.tree
    }

    /// How this configuration was loaded (None when built by hand)
    pub fn provenance(&self) -> Option<&Provenance> {
        self.provenance.as_ref()
    }

    pub(crate) fn set_provenance(&mut self, provenance: Provenance) {
        self.provenance = Some(provenance);
    }

    /// Compact JSON rendering of the tree
    pub fn to_json(&self) -> String {
        self.tree.to_json()
    }

    /// Indented JSON rendering of the tree
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        self.tree.to_json_pretty()
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.tree, f)
    }
}

impl From<Map> for Config {
    fn from(map: Map) -> Self {
        Self::from_map(map)
    }
}

fn parse_key(key: &str, empty_message: &str) -> Result<KeyPath, ConfError> {
    KeyPath::parse(key).map_err(|e| match e {
        PathError::Empty => ConfError::invalid_argument(empty_message),
        PathError::EmptySegment(_) => ConfError::invalid_argument(format!("Invalid configuration {}", e)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use conf_tree::Opaque;
    use serde_json::json;

    fn config(json: serde_json::Value) -> Config {
        Config::from_json(json).unwrap()
    }

    fn map(json: serde_json::Value) -> Map {
        config(json).into_tree().into_map()
    }

    #[derive(Debug)]
    struct Foo {
        foo: String,
    }

    impl Opaque for Foo {
        fn to_json(&self) -> serde_json::Value {
            json!({"foo": self.foo})
        }
    }

    #[test]
    fn test_initializes_passed_object() {
        let config = config(json!({"foo": "foo"}));
        assert_eq!(config.get("foo").unwrap(), &Value::from("foo"));
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        let err = Config::from_json(json!([1, 2])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_merge_overwrites_existing() {
        let mut config = config(json!({"overwritten": false}));
        config.merge(map(json!({"overwritten": true})));

        assert_eq!(config.get("overwritten").unwrap().as_bool(), Some(true));
    }

    #[test]
    fn test_merge_adds_new_and_keeps_existing() {
        let mut config = config(json!({"existing": true}));
        config.merge(map(json!({"added": true})));

        assert_eq!(config.get("added").unwrap().as_bool(), Some(true));
        assert_eq!(config.get("existing").unwrap().as_bool(), Some(true));
    }

    #[test]
    fn test_merge_merges_existing_maps() {
        let mut config = Config::new();
        config.merge(map(json!({"environments": {"all": "all"}})));
        config.merge(map(json!({"environments": {"test": "test"}})));
        config.merge(map(json!({"secrets": {"test": "test"}})));

        assert_eq!(
            config.get("environments").unwrap(),
            &Value::from(json!({"all": "all", "test": "test"}))
        );
        assert_eq!(
            config.get("secrets").unwrap(),
            &Value::from(json!({"test": "test"}))
        );
    }

    #[test]
    fn test_merge_does_not_merge_lists() {
        let mut config = config(json!({"foo": ["foo", "bar"]}));
        config.merge(map(json!({"foo": ["quz"]})));

        assert_eq!(config.get("foo").unwrap(), &Value::from(json!(["quz"])));
    }

    #[test]
    fn test_merge_keeps_opaque_instance() {
        let mut config = config(json!({"foo": {"bar": "bar"}}));
        let foo = Value::opaque(Foo {
            foo: "foo".to_string(),
        });

        let mut overlay = Map::new();
        overlay.insert("foo".to_string(), foo.clone());
        config.merge(overlay);

        assert_eq!(config.get("foo").unwrap(), &foo);
        assert!(matches!(
            config.get("foo:bar"),
            Err(ConfError::MissingKey { .. })
        ));
        assert_eq!(
            config.get("foo").unwrap().downcast_opaque::<Foo>().unwrap().foo,
            "foo"
        );
    }

    #[test]
    fn test_merge_empty_is_identity() {
        let mut config = config(json!({"a": {"b": 1}, "c": [true]}));
        let before = config.clone();
        config.merge(Map::new());

        assert_eq!(config, before);
    }

    #[test]
    fn test_set_value() {
        let mut config = Config::new();
        config.set("foo", "foo").unwrap();

        assert_eq!(config.get("foo").unwrap().as_str(), Some("foo"));
    }

    #[test]
    fn test_set_nested_value() {
        let mut config = Config::new();
        config.set("foo:bar", "foobar").unwrap();

        assert_eq!(config.get("foo:bar").unwrap().as_str(), Some("foobar"));
        assert_eq!(config.get("foo").unwrap(), &Value::from(json!({"bar": "foobar"})));
    }

    #[test]
    fn test_set_rejects_empty_key() {
        let mut config = Config::new();
        assert_eq!(
            config.set("", 1).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            config.set("a::b", 1).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn test_get_nested_object() {
        let config = config(json!({"foo": {"bar": "foobar"}}));
        assert_eq!(config.get("foo").unwrap(), &Value::from(json!({"bar": "foobar"})));
    }

    #[test]
    fn test_get_null_is_missing() {
        let config = config(json!({"test": null}));
        let err = config.get("test").unwrap_err();

        assert_eq!(
            err,
            ConfError::MissingKey {
                key: "test".to_string()
            }
        );
        assert_eq!(config.get_or("test", "fallback").unwrap(), Value::from("fallback"));
    }

    #[test]
    fn test_get_falls_back_to_default() {
        let config = Config::new();
        assert_eq!(config.get_or("foo", "defaultFoo").unwrap(), Value::from("defaultFoo"));
    }

    #[test]
    fn test_get_falls_back_to_null_default() {
        let config = Config::new();
        assert_eq!(config.get_or("foo", Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn test_get_present_value_ignores_default() {
        let config = config(json!({"port": 8080}));
        assert_eq!(config.get_or("port", 1).unwrap(), Value::from(8080));
    }

    #[test]
    fn test_get_missing_without_default() {
        let config = Config::new();
        let err = config.get("environments_staging").unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MissingKey);
        assert!(err
            .to_string()
            .contains("Failed to get the required configuration for the key"));
    }

    #[test]
    fn test_get_empty_key() {
        let config = Config::new();
        let err = config.get("").unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.to_string().contains("undefined key"));
        assert_eq!(
            config.get_or("", 1).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn test_to_string_is_json() {
        let config = config(json!({"test": true}));
        assert_eq!(config.to_string(), r#"{"test":true}"#);
        assert_eq!(config.to_json(), r#"{"test":true}"#);
    }

    #[test]
    fn test_hand_built_has_no_provenance() {
        assert!(Config::new().provenance().is_none());
    }
}
