//! Error types for storage operations

use thiserror::Error;

/// Error type for storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// Listing the bucket failed
    #[error("object listing failed: {0}")]
    List(String),

    /// Secret retrieval failed
    #[error("secret retrieval failed: {0}")]
    Secret(String),

    /// Secret exists but holds no usable value
    #[error("secret '{0}' is empty")]
    EmptySecret(String),
}

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;
