//! Error types for opsplit.
//!
//! Library crates use [`OpsplitError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all opsplit operations.
#[derive(Debug, thiserror::Error)]
pub enum OpsplitError {
    /// Configuration loading or validation error (bad knowledge-base path,
    /// missing credentials, unusable config file).
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while talking to a generation backend.
    #[error("network error: {0}")]
    Network(String),

    /// Text or JSON parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Generation backend error (bad status, malformed response body).
    #[error("backend error: {0}")]
    Backend(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (schema mismatch, invalid format, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, OpsplitError>;

impl OpsplitError {
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = OpsplitError::config("knowledge base path is not a directory");
        assert_eq!(
            err.to_string(),
            "config error: knowledge base path is not a directory"
        );

        let err = OpsplitError::Backend("HTTP 429 from api.openai.com".into());
        assert!(err.to_string().contains("429"));
    }
}
