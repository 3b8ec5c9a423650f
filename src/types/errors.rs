//! Error types for Lookaside.

use thiserror::Error;

/// Default result type for Lookaside.
pub type LookasideResult<T> = Result<T, LookasideError>;

/// Application-level errors.
///
/// The cache itself never fails; these cover configuration, I/O, the stdio
/// protocol and resolver failures surfaced to a caller.
#[derive(Error, Debug)]
pub enum LookasideError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[cfg(feature = "cli")]
    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("{0}")]
    Other(String),
}

impl LookasideError {
    /// Creates a generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }

    /// Creates a configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }
}

/// Failure of the external payload source.
///
/// `Clone` so a single resolution can be fanned out to every caller waiting
/// on the same key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no payload found for key '{key}'")]
    NotFound { key: String },

    #[error("resolution of '{key}' failed: {reason}")]
    Failed { key: String, reason: String },
}

impl ResolveError {
    /// Creates a not-found error for `key`.
    pub fn not_found<S: Into<String>>(key: S) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Creates a generic failure for `key`.
    pub fn failed<K: Into<String>, R: Into<String>>(key: K, reason: R) -> Self {
        Self::Failed {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// The key whose resolution failed.
    pub fn key(&self) -> &str {
        match self {
            Self::NotFound { key } | Self::Failed { key, .. } => key,
        }
    }
}
