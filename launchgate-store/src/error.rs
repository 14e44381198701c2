//! Store error types.

use thiserror::Error;

/// Errors from persisted record operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error reading or writing a record file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Returns true when the error is a missing-file condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}
