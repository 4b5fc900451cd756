use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by hooks and the document layer
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("failed to serialize {format} document: {message}")]
    Serialize {
        format: &'static str,
        message: String,
    },

    /// A key held a value of an unexpected type
    #[error("key '{key}' is not {expected}")]
    WrongType { key: String, expected: &'static str },

    /// A key that must already exist was missing
    #[error("key '{key}' does not exist")]
    MissingKey { key: String },

    #[error("invalid path; got '{}'", path.display())]
    InvalidPath { path: PathBuf },

    #[error("invalid requirement '{0}'")]
    Requirement(String),

    #[error("invalid version '{0}'")]
    Version(String),

    /// An external tool could not be started or exited non-zero
    #[error("`{program}` failed: {message}")]
    Tool { program: String, message: String },

    /// A configuration value differs from what it must be
    #[error("{field}: expected {expected}, got {actual}")]
    Validation {
        field: String,
        expected: String,
        actual: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn wrong_type(key: impl Into<String>, expected: &'static str) -> Self {
        Self::WrongType {
            key: key.into(),
            expected,
        }
    }

    pub(crate) fn missing(key: impl Into<String>) -> Self {
        Self::MissingKey { key: key.into() }
    }
}
