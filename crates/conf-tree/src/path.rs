//! Key addressing
//!
//! Human-facing keys nest with `:` (`server:host`). Environment variable
//! names nest with `__` (`server__host`). Both are first rewritten to the
//! canonical `/` delimiter and then split into segments.

use std::fmt;

/// Canonical nesting delimiter every key form is rewritten to.
pub const DELIMITER: char = '/';

/// Nesting delimiter in configuration keys.
pub const KEY_SEPARATOR: char = ':';

/// Nesting delimiter in environment variable names.
pub const ENV_SEPARATOR: &str = "__";

/// Errors turning a key into a path
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("key is empty")]
    Empty,

    #[error("key '{0}' contains an empty segment")]
    EmptySegment(String),
}

/// A position in the tree: one or more non-empty segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPath {
    segments: Vec<String>,
}

impl KeyPath {
    /// Parse a `:`-delimited configuration key.
    pub fn parse(key: &str) -> Result<Self, PathError> {
        Self::split(key, &key.replace(KEY_SEPARATOR, "/"))
    }

    /// Parse a `__`-delimited environment variable name.
    pub fn from_env_name(name: &str) -> Result<Self, PathError> {
        Self::split(name, &name.replace(ENV_SEPARATOR, "/"))
    }

    fn split(original: &str, canonical: &str) -> Result<Self, PathError> {
        if canonical.is_empty() {
            return Err(PathError::Empty);
        }

        let segments: Vec<String> = canonical.split(DELIMITER).map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(PathError::EmptySegment(original.to_string()));
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join(":"))
    }
}
