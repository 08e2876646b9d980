//! Error types for canvas operations.

use thiserror::Error;

use crate::ElementId;

/// Result type for canvas operations.
pub type ArtResult<T> = Result<T, ArtError>;

/// Errors that can occur in canvas operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArtError {
    /// Element parameters were rejected (bad emoji, non-positive size or factor).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The referenced element is not part of the snapshot.
    #[error("Element not found: {0}")]
    NotFound(ElementId),

    /// Serialized canvas data could not be decoded.
    #[error("Corrupt canvas data: {0}")]
    CorruptData(String),
}

impl From<serde_json::Error> for ArtError {
    fn from(err: serde_json::Error) -> Self {
        Self::CorruptData(err.to_string())
    }
}
