//! Core error types for wakescroll-core.
//!
//! This module defines the error hierarchy using thiserror. Reads that fail
//! are recovered locally by the stores; everything that reaches a caller is
//! one of the variants below.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for wakescroll-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Storage-related errors (failed writes reach the caller)
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The entity already has a completion recorded for this day
    #[error("'{entity_id}' was already completed on {day}")]
    DuplicateCompletion {
        entity_id: String,
        day: chrono::NaiveDate,
    },

    /// A referenced record does not exist
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Key-value storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the backing database
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Store is locked by another connection
    #[error("Store is locked")]
    Locked,

    /// The connection mutex was poisoned by a panicking writer
    #[error("Store connection poisoned")]
    Poisoned,

    /// Value could not be encoded for storage
    #[error("Failed to encode value for '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// Month outside 1..=12 or otherwise impossible date
    #[error("Invalid calendar date: {year}-{month:02}")]
    InvalidMonth { year: i32, month: u32 },

    /// Empty required text
    #[error("'{0}' must not be empty")]
    Empty(String),
}

/// Errors reported by a notification delivery service.
///
/// These never propagate out of the scheduler; they are logged and counted.
#[derive(Error, Debug)]
pub enum SchedulingError {
    #[error("Notification platform rejected request: {0}")]
    Rejected(String),

    #[error("Notification '{0}' not found")]
    UnknownNotification(String),

    #[error("Notification store error: {0}")]
    Storage(#[from] StorageError),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked
                    || err.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    StorageError::Locked
                } else {
                    StorageError::QueryFailed(err.to_string())
                }
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Storage(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
