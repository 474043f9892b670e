//! Error types for batch construction

use thiserror::Error;

/// Error type for batch construction
#[derive(Debug, Error)]
pub enum BatchError {
    /// Request body could not be interpreted as a configuration object
    #[error("invalid configuration: {0}")]
    ConfigValidation(String),

    /// Discovery produced nothing to build a batch from
    #[error("no work units found under '{0}'")]
    NoUnitsFound(String),
}

/// Result type for batch construction
pub type Result<T> = std::result::Result<T, BatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BatchError::ConfigValidation("BATCH_SIZE must be a number".to_string());
        assert_eq!(
            err.to_string(),
            "invalid configuration: BATCH_SIZE must be a number"
        );

        let err = BatchError::NoUnitsFound("csv/".to_string());
        assert_eq!(err.to_string(), "no work units found under 'csv/'");
    }
}
