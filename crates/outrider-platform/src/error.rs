//! Error types for compute platform operations

use thiserror::Error;

/// Error type for compute platform operations
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Node absent from the platform inventory
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// Node observed in a state the orchestrator cannot drive to running
    #[error("node {node} is in state '{state}' and cannot be used")]
    NodeState { node: String, state: String },

    /// Node never reached the running state within the attempt ceiling
    #[error("node {node} did not reach 'running' within {attempts} attempts")]
    ReadyTimeout { node: String, attempts: u32 },

    /// Control-plane API failure
    #[error("platform API error: {0}")]
    Api(String),

    /// Invalid client configuration
    #[error("invalid platform configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for compute platform operations
pub type Result<T> = std::result::Result<T, PlatformError>;
