//! Layer resolution
//!
//! A resolver turns a layer name into the layer's parsed content. Absence
//! and breakage are distinct, typed outcomes so the loader can tolerate a
//! missing optional layer without ever swallowing a broken one.

use conf_tree::{Map, Value};
use sha2::{Digest, Sha256};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use walkdir::WalkDir;

/// Directory holding one layer file per environment
pub const ENVIRONMENTS_DIR: &str = "environments";

/// Base layer file name shared by every environment
pub const ALL_ENVIRONMENTS: &str = "all";

/// Why a layer could not be resolved
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayerError {
    /// The layer does not exist
    #[error("layer not found at {location}")]
    NotFound { location: String },

    /// The layer exists but could not be read or parsed
    #[error("layer at {location} is broken: {reason}")]
    Broken { location: String, reason: String },
}

/// Parsed content of one layer
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLayer {
    pub content: Map,

    /// Human-readable origin (file path, memory key)
    pub location: String,

    /// SHA-256 digest of the raw bytes, when there are any
    pub digest: Option<String>,
}

/// Source of configuration layers
pub trait ResolveLayer {
    /// Resolve `layer` (e.g. `environments/test`) below `root`.
    fn resolve(&self, root: &Path, layer: &str) -> Result<ResolvedLayer, LayerError>;
}

/// On-disk layer encoding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LayerFormat {
    #[default]
    Toml,
    Json,
}

impl LayerFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            LayerFormat::Toml => "toml",
            LayerFormat::Json => "json",
        }
    }

    /// Parse a document whose top level must be a table/object
    pub fn parse(&self, contents: &str) -> Result<Map, String> {
        match self {
            LayerFormat::Toml => {
                let table: toml::Table = toml::from_str(contents)
                    .map_err(|e| format!("TOML parse error: {}", e))?;
                Ok(table
                    .into_iter()
                    .map(|(k, v)| (k, toml_to_value(v)))
                    .collect())
            }
            LayerFormat::Json => {
                let json: serde_json::Value = serde_json::from_str(contents)
                    .map_err(|e| format!("JSON parse error: {}", e))?;
                match Value::from(json) {
                    Value::Map(map) => Ok(map),
                    _ => Err("top-level JSON value must be an object".to_string()),
                }
            }
        }
    }
}

impl FromStr for LayerFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "toml" => Ok(LayerFormat::Toml),
            "json" => Ok(LayerFormat::Json),
            other => Err(format!("unknown layer format '{}' (expected toml or json)", other)),
        }
    }
}

/// Convert a TOML value into a tree value
fn toml_to_value(toml: toml::Value) -> Value {
    match toml {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => Value::from(f),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(arr) => Value::List(arr.into_iter().map(toml_to_value).collect()),
        toml::Value::Table(table) => Value::Map(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_value(v)))
                .collect(),
        ),
    }
}

/// Reads `<root>/<layer>.<ext>` files
#[derive(Debug, Clone, Copy, Default)]
pub struct FileResolver {
    format: LayerFormat,
}

impl FileResolver {
    pub fn new(format: LayerFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> LayerFormat {
        self.format
    }

    /// File path for `layer` below `root`
    pub fn layer_path(&self, root: &Path, layer: &str) -> PathBuf {
        let file = format!("{}.{}", layer, self.format.extension());
        let mut path = root.to_path_buf();
        for part in file.split('/') {
            path.push(part);
        }
        path
    }

    /// Environment names with a layer file under `<root>/environments`,
    /// excluding the shared base layer. Sorted.
    pub fn list_environments(&self, root: &Path) -> Result<Vec<String>, LayerError> {
        let dir = root.join(ENVIRONMENTS_DIR);
        let location = dir.display().to_string();
        if !dir.is_dir() {
            return Err(LayerError::NotFound { location });
        }

        let mut names = Vec::new();
        for entry in WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| LayerError::Broken {
                location: location.clone(),
                reason: e.to_string(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(self.format.extension()) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if stem != ALL_ENVIRONMENTS {
                    names.push(stem.to_string());
                }
            }
        }

        Ok(names)
    }
}

impl ResolveLayer for FileResolver {
    fn resolve(&self, root: &Path, layer: &str) -> Result<ResolvedLayer, LayerError> {
        let path = self.layer_path(root, layer);
        let location = path.display().to_string();

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(LayerError::NotFound { location });
            }
            Err(e) => {
                return Err(LayerError::Broken {
                    location,
                    reason: e.to_string(),
                });
            }
        };

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let digest = hex::encode(hasher.finalize());

        let contents = match String::from_utf8(bytes) {
            Ok(contents) => contents,
            Err(e) => {
                return Err(LayerError::Broken {
                    location,
                    reason: format!("Invalid UTF-8: {}", e),
                });
            }
        };

        match self.format.parse(&contents) {
            Ok(content) => Ok(ResolvedLayer {
                content,
                location,
                digest: Some(digest),
            }),
            Err(reason) => Err(LayerError::Broken { location, reason }),
        }
    }
}

/// In-memory layers keyed by layer name, for embedding and tests
///
/// Records every requested layer name in order.
#[derive(Debug, Default)]
pub struct MemoryResolver {
    layers: BTreeMap<String, Result<Map, String>>,
    requests: RefCell<Vec<String>>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a layer with the given content
    pub fn with_layer(mut self, name: impl Into<String>, content: Map) -> Self {
        self.layers.insert(name.into(), Ok(content));
        self
    }

    /// Register a layer that exists but fails to load
    pub fn with_broken(mut self, name: impl Into<String>, reason: impl Into<String>) -> Self {
        self.layers.insert(name.into(), Err(reason.into()));
        self
    }

    /// Layer names requested so far
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl ResolveLayer for MemoryResolver {
    fn resolve(&self, _root: &Path, layer: &str) -> Result<ResolvedLayer, LayerError> {
        self.requests.borrow_mut().push(layer.to_string());

        let location = format!("memory:{}", layer);
        match self.layers.get(layer) {
            Some(Ok(content)) => Ok(ResolvedLayer {
                content: content.clone(),
                location,
                digest: None,
            }),
            Some(Err(reason)) => Err(LayerError::Broken {
                location,
                reason: reason.clone(),
            }),
            None => Err(LayerError::NotFound { location }),
        }
    }
}
