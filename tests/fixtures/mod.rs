//! Test fixtures for layered loading
//!
//! - `config/`: TOML layer tree (environments + secrets)
//! - `config-json/`: the same layout encoded as JSON

#![allow(dead_code)]

use std::path::{Path, PathBuf};

/// Root of the TOML layer fixtures
pub fn toml_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/config")
}

/// Root of the JSON layer fixtures
pub fn json_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/config-json")
}
