use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by board stores regardless of the underlying medium.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The identifier is not a valid board id.
    #[error("invalid board id `{id}`")]
    InvalidId { id: String },
    /// No board is stored under that identifier.
    #[error("board `{id}` not found")]
    NotFound { id: String },
    /// The stored document is not a valid board definition.
    #[error("board `{id}` is malformed")]
    Malformed {
        id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("storage unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}
