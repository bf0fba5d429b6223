//! Error types for topicpress.
//!
//! Library crates use [`TopicPressError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all topicpress operations.
#[derive(Debug, thiserror::Error)]
pub enum TopicPressError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// The table-of-contents document does not have the expected structure.
    #[error("malformed topic tree: {message}")]
    MalformedTree { message: String },

    /// The table-of-contents file is absent.
    #[error("topic tree file not found: {}", path.display())]
    MissingTreeFile { path: PathBuf },

    /// The product version file is absent.
    #[error("version file not found: {}", path.display())]
    MissingVersionFile { path: PathBuf },

    /// A topic references a document that does not exist on disk.
    #[error("document '{id}' not found at {}", path.display())]
    DocumentNotFound { id: String, path: PathBuf },

    /// Filesystem read error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Writing an output file (document write-back or combined file) failed.
    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input data validation error (empty version string, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// The external renderer could not be started or reported failure.
    #[error("render error: {message}")]
    Render { message: String },

    /// A per-document worker task panicked or was cancelled.
    #[error("document task failed: {0}")]
    Task(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TopicPressError>;

impl TopicPressError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a malformed-tree error from any displayable message.
    pub fn malformed_tree(msg: impl Into<String>) -> Self {
        Self::MalformedTree {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a render error from any displayable message.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` from a read with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a `std::io::Error` from a write with a path for context.
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}
