//! Layer provenance
//!
//! Records which layers contributed to a loaded configuration, in
//! precedence order, with a digest of each file-backed layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Position of a layer in the precedence order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LayerOrigin {
    /// Shared by every environment
    Base,
    /// Named after the environment
    Environment,
    /// Optional secrets overlay for the environment
    Secrets,
    /// Process environment variables
    Variables,
}

/// A contributing layer with provenance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayerSource {
    /// Precedence position of this layer
    pub origin: LayerOrigin,

    /// Layer name (e.g. `environments/all`)
    pub name: String,

    /// Where the resolver found the layer (None for variables)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// SHA-256 digest of raw layer bytes, when the resolver reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// How a configuration was assembled
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Provenance {
    /// Environment name the layers were resolved for
    pub environment: String,

    /// When the layers were merged
    pub loaded_at: DateTime<Utc>,

    /// Layers that were merged, lowest precedence first
    pub sources: Vec<LayerSource>,
}

impl Provenance {
    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Names of merged layers, lowest precedence first
    pub fn layer_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name.as_str()).collect()
    }
}
