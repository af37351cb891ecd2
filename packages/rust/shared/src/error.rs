//! Error types for ContentFlow.
//!
//! Library crates use [`ContentFlowError`] via `thiserror`.
//! The service binary wraps this with `color-eyre` for rich diagnostics and
//! maps it onto HTTP status codes at the route boundary.

use std::path::PathBuf;

use crate::types::Stage;

/// Top-level error type for all ContentFlow operations.
#[derive(Debug, thiserror::Error)]
pub enum ContentFlowError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while talking to the data store.
    #[error("network error: {0}")]
    Network(String),

    /// Data store rejected a request or returned something unusable.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Malformed input (bad identifier, missing fields, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// The requested PRD does not exist.
    #[error("prd_not_found")]
    PrdNotFound,

    /// A pipeline step needs a prior stage that has never been written.
    #[error("missing_{0}")]
    MissingStage(Stage),

    /// Missing or wrong service key.
    #[error("bad key")]
    Unauthorized,
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ContentFlowError>;

impl ContentFlowError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Short machine-readable code surfaced to API clients as `detail`.
    ///
    /// Domain failures have stable codes (`prd_not_found`,
    /// `missing_research`, ...); validation errors surface their message.
    pub fn code(&self) -> String {
        match self {
            Self::PrdNotFound | Self::MissingStage(_) | Self::Unauthorized => self.to_string(),
            Self::Validation { message } => message.clone(),
            other => other.to_string(),
        }
    }
}
