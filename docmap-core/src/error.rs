//! Error and result types for mapper operations.
//!
//! Use [`DocmapResult<T>`] as the return type for fallible operations. Outcomes
//! the mapper treats as recoverable (validation misses, lookup misses,
//! unacknowledged writes) are carried inside `Ok` as booleans or `Option`s;
//! only transport and serialization faults surface as errors.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

use crate::validations::ValidationErrors;

/// Represents all possible errors that can occur while mapping records to a
/// document store.
#[derive(Error, Debug)]
pub enum DocmapError {
    /// Raised only by the strict save variant when validation fails.
    /// Carries the full per-field error collection.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),
    /// Serialization/deserialization error when converting between a model
    /// and its document representation (BSON, JSON).
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// An error reported by the underlying document store.
    #[error("Store error: {0}")]
    Store(String),
    /// Error during store initialization or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
}

/// A specialized `Result` type for mapper operations.
pub type DocmapResult<T> = Result<T, DocmapError>;

impl From<BsonError> for DocmapError {
    fn from(err: BsonError) -> Self {
        DocmapError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for DocmapError {
    fn from(err: SerdeJsonError) -> Self {
        DocmapError::Serialization(err.to_string())
    }
}
