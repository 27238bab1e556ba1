//! Core error types for restbell-core.
//!
//! Invalid exercise configuration is rejected at construction time via
//! [`SpecError`] -- never silently clamped. Timer precondition violations
//! (e.g. `start()` while running) are silent no-ops on the engine and do
//! not appear here. Side-effect failures stay inside the dispatcher.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for restbell-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Invalid interval configuration
    #[error("Interval spec error: {0}")]
    Spec(#[from] SpecError),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Rejected `IntervalSpec` parameters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecError {
    #[error("total_sets must be at least 1 (got {0})")]
    InvalidSetCount(u32),

    #[error("time-based exercise requires work_secs >= 1 (got {0})")]
    InvalidWorkDuration(u32),
}

/// Exercise store errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open database
    #[error("Failed to open exercise store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Row lookup miss
    #[error("No exercise with id {0}")]
    NotFound(i64),
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::QueryFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
