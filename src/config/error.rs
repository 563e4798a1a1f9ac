//! Configuration error taxonomy

use std::fmt;

/// Stable error kinds for automation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller misuse: empty key, missing environment name, relative root
    InvalidArgument,
    /// A required layer does not exist
    SourceNotFound,
    /// A layer exists but could not be read or parsed
    SourceLoad,
    /// No value for a key and no default supplied
    MissingKey,
}

impl ErrorKind {
    /// Returns the string representation of the error kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "INVALID_ARGUMENT",
            ErrorKind::SourceNotFound => "SOURCE_NOT_FOUND",
            ErrorKind::SourceLoad => "SOURCE_LOAD",
            ErrorKind::MissingKey => "MISSING_KEY",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("Cannot find required configuration layer '{layer}' at {location}")]
    SourceNotFound { layer: String, location: String },

    #[error("Failed to load configuration layer '{layer}' from {location}: {reason}")]
    SourceLoad {
        layer: String,
        location: String,
        reason: String,
    },

    #[error(
        "Failed to get the required configuration for the key '{key}'. \
         You might want to add that key in your config file."
    )]
    MissingKey { key: String },
}

impl ConfError {
    /// Returns the kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConfError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            ConfError::SourceNotFound { .. } => ErrorKind::SourceNotFound,
            ConfError::SourceLoad { .. } => ErrorKind::SourceLoad,
            ConfError::MissingKey { .. } => ErrorKind::MissingKey,
        }
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        ConfError::InvalidArgument(message.into())
    }
}
