//! Error types for mealtrace.

use thiserror::Error;

/// Result type alias using mealtrace's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for mealtrace operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Record store operation failed
    #[error("Store error: {0}")]
    Store(String),

    /// Meal not found
    #[error("Meal not found: {0}")]
    MealNotFound(uuid::Uuid),

    /// Classification call failed for an entire batch of names
    #[error("Classification error: {0}")]
    Classification(String),

    /// Input rejected before enrichment (no classifiable items, bad fields)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Optimistic concurrency check failed on a store write
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Batch execution aborted before this input was processed
    #[error("Aborted: {0}")]
    Aborted(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
