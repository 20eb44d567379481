//! Error types and result types for persistence operations.
//!
//! Every fallible operation in recordlayer returns [`PersistenceResult<T>`]. Loader and saver
//! implementations report their failures through the same type so that they propagate
//! unchanged to the caller of the store operation that triggered them.

use serde_json::Error as SerdeJsonError;
use std::io::Error as IoError;
use thiserror::Error;

/// Represents all possible errors that can occur when interacting with a persistence component.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// The record addressed by the given identifier does not exist.
    #[error("Record not found: {0}")]
    NotFound(String),
    /// The external medium behind a loader or saver failed.
    #[error("I/O error: {0}")]
    Io(String),
    /// A configuration option carried an invalid value.
    ///
    /// The component keeps its previous valid configuration when this is returned.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// Converting a record to or from its field representation failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// The record or field map does not have the shape the store expects.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

/// A specialized `Result` type for persistence operations.
pub type PersistenceResult<T> = Result<T, PersistenceError>;

impl From<IoError> for PersistenceError {
    fn from(err: IoError) -> Self {
        PersistenceError::Io(err.to_string())
    }
}

impl From<SerdeJsonError> for PersistenceError {
    fn from(err: SerdeJsonError) -> Self {
        PersistenceError::Serialization(err.to_string())
    }
}
