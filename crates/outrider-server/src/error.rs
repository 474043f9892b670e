//! Request-level error type and HTTP status mapping
//!
//! Component failures propagate here unchanged; this is the single place
//! they are mapped to an HTTP status and the JSON error envelope.
//! Validation-class errors get explicit statuses, everything else is a 500
//! because the caller cannot fix infrastructure trouble.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use outrider_batch::BatchError;
use outrider_common::ErrorResponse;
use outrider_dispatch::DispatchError;
use outrider_platform::PlatformError;
use outrider_storage::StorageError;
use thiserror::Error;
use tracing::error;

/// Error type for request handling
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request body
    #[error("invalid request: {0}")]
    Validation(String),

    /// No route matched the request
    #[error("route not found: {0}")]
    RouteNotFound(String),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ApiError {
    /// HTTP status for this failure class
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Batch(BatchError::ConfigValidation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Batch(BatchError::NoUnitsFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Platform(_) | ApiError::Dispatch(_) | ApiError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(%status, error = %self, "request failed");
        }
        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::Validation("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::RouteNotFound("GET /x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Batch(BatchError::NoUnitsFound("csv/".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Batch(BatchError::ConfigValidation("x".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Platform(PlatformError::NodeNotFound("n".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Dispatch(DispatchError::ChannelUnavailable("x".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Storage(StorageError::List("x".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
