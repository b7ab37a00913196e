//! Error types for JsonDB
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using JsonDbError
pub type Result<T> = std::result::Result<T, JsonDbError>;

/// Unified error type for JsonDB operations
#[derive(Debug, Error)]
pub enum JsonDbError {
    // -------------------------------------------------------------------------
    // Context Errors
    // -------------------------------------------------------------------------
    #[error("No database or collection selected")]
    NotSelected,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    // -------------------------------------------------------------------------
    // Constraint Errors
    // -------------------------------------------------------------------------
    #[error("Unique constraint violated on field '{field}'")]
    ConstraintViolation { field: String },

    // -------------------------------------------------------------------------
    // Input Errors
    // -------------------------------------------------------------------------
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("Storage I/O error on {}: {source}", path.display())]
    StorageIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl JsonDbError {
    /// Wrap an I/O failure on a persisted file, keeping the path
    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::StorageIo {
            path: path.into(),
            source,
        }
    }

    /// Caller supplied JSON that does not parse
    pub(crate) fn malformed(err: serde_json::Error) -> Self {
        Self::MalformedInput(err.to_string())
    }
}
