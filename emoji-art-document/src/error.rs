//! Error types for background fetching, persistence and the controller handle.

use emoji_art_core::ArtError;
use thiserror::Error;
use url::Url;

/// Errors that can occur while retrieving or decoding a background image.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP layer failed (connection, TLS, transport timeout).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{url} answered with HTTP {status}")]
    Status {
        /// Requested URL.
        url: Url,
        /// HTTP status code.
        status: u16,
    },

    /// Reading a local file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A `data:` URI could not be parsed.
    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),

    /// The URL scheme cannot be retrieved.
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    /// The bytes are not a decodable image.
    #[error("Failed to decode image: {0}")]
    Decode(String),
}

/// Errors that can occur while loading or writing the persisted document.
#[derive(Debug, Error)]
pub enum PersistError {
    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot could not be encoded.
    #[error("Serialization error: {0}")]
    Serialize(#[from] ArtError),

    /// The store was configured to reject writes.
    #[error("Write rejected: {0}")]
    Rejected(String),
}

/// Errors returned by awaiting calls on a document handle.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The controller task has stopped.
    #[error("Document controller is closed")]
    Closed,

    /// A requested write failed.
    #[error("Persistence failed: {0}")]
    Persist(#[from] PersistError),
}
