//! Layered Conf - environment-layered configuration
//!
//! This crate resolves a process's configuration by merging a shared base
//! layer, an environment layer, an optional secrets overlay and the process
//! environment variables, then exposes the result through `:`-delimited keys.

pub mod config;
pub mod loader;

pub use config::{ConfError, Config, ErrorKind, LayerOrigin, LayerSource, Provenance};
pub use loader::{
    fold_environment, layer_plan, load_environment, load_environment_from_process,
    EnvironmentSnapshot, FileResolver, LayerError, LayerFormat, MemoryResolver, ResolveLayer,
    ResolvedLayer,
};

pub use conf_tree::{ConfigTree, KeyPath, Map, Opaque, OpaqueValue, Value};
