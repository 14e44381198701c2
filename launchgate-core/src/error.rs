//! Core error types for Launchgate.

use thiserror::Error;

/// Core error type for launch engine operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A platform collaborator failed to configure or respond.
    #[error("SDK failure: {0}")]
    Sdk(String),

    /// Invalid data from a collaborator callback or persisted record.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}
