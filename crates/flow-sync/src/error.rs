//! Sync error types.

use std::path::PathBuf;

use thiserror::Error;

/// Failure talking to the remote collection.
#[derive(Debug, Error)]
pub enum SyncError {
    /// File I/O error in a file-backed remote.
    #[error("Failed to {operation} file: {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The remote refused or lost the request.
    #[error("Remote store unavailable: {message}")]
    Unavailable { message: String },

    /// Collection could not be encoded for upload.
    #[error("Failed to serialize remote collection")]
    Serialization {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Collection fetched from the remote could not be decoded.
    #[error("Failed to deserialize remote collection")]
    Deserialization {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Temp file couldn't be renamed over the collection file.
    #[error("Failed to complete upload of {target_path}")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
