//! Error types for chemfuse.
//!
//! Library crates use [`ChemFuseError`] via `thiserror`.
//! The server binary wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all chemfuse operations.
#[derive(Debug, thiserror::Error)]
pub enum ChemFuseError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while talking to a data provider.
    #[error("network error: {0}")]
    Network(String),

    /// HTML parsing or content extraction error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// A provider returned a payload the service cannot decode.
    #[error("provider error: {0}")]
    Provider(String),

    /// Client-input validation error (batch bounds, identifier format).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ChemFuseError>;

impl ChemFuseError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
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

    /// True for errors the HTTP layer should report as a client fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}
