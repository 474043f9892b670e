//! Error types for dispatch operations

use thiserror::Error;

/// Error type for dispatch operations
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The execution channel rejected or failed the submission
    #[error("execution channel unavailable: {0}")]
    ChannelUnavailable(String),

    /// Batch exceeds the channel's payload limit
    #[error("batch payload is {size} bytes, channel limit is {limit}")]
    PayloadTooLarge { size: usize, limit: usize },
}

/// Result type for dispatch operations
pub type Result<T> = std::result::Result<T, DispatchError>;
