//! Error types for assetporter.
//!
//! Library crates use [`AssetPorterError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Per-reference fetch failures are deliberately *not* represented here:
//! they are absorbed into the migration mapping as identity fallbacks and
//! never terminate a run (see `assetporter-fetch::FetchError`).

use std::path::PathBuf;

/// Top-level error type for all assetporter operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetPorterError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Failed to read the input dataset. Fatal; aborts the run.
    #[error("dataset read error at {path:?}: {message}")]
    DatasetRead { path: PathBuf, message: String },

    /// Failed to write the output dataset. Fatal; aborts the run.
    #[error("dataset write error at {path:?}: {message}")]
    DatasetWrite { path: PathBuf, message: String },

    /// Asset storage layer error (storage root creation, persist).
    #[error("storage error: {0}")]
    Storage(String),

    /// HTTP client construction error.
    #[error("network error: {0}")]
    Network(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (unknown column, empty dataset, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, AssetPorterError>;

impl AssetPorterError {
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

    /// Create a dataset read error with the offending path.
    pub fn dataset_read(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::DatasetRead {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create a dataset write error with the offending path.
    pub fn dataset_write(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::DatasetWrite {
            path: path.into(),
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
