//! HTTP request handlers

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::Json;
use outrider_batch::TransferDirection;
use serde_json::Value;

use crate::error::ApiError;
use crate::orchestrator;
use crate::AppState;

/// GET /download-start: stage the discovered dataset onto the node and
/// back the originals up.
pub async fn download_start(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let response = orchestrator::run_bulk_transfer(&state, TransferDirection::Download).await?;
    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// GET /rollback, /rollback-ssm: restore backed-up units to the source
/// prefix.
pub async fn rollback(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let response = orchestrator::run_bulk_transfer(&state, TransferDirection::Rollback).await?;
    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// GET/POST /start-training: launch a training run; the optional JSON
/// body overrides the mode preset field by field.
pub async fn start_training(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let body_value: Option<Value> = if body.is_empty() {
        None
    } else {
        Some(serde_json::from_slice(&body).map_err(|e| {
            ApiError::Validation(format!("request body is not valid JSON: {}", e))
        })?)
    };

    let response = orchestrator::run_training_launch(&state, body_value).await?;
    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// Anything without a matching route.
pub async fn fallback(method: Method, uri: Uri) -> ApiError {
    ApiError::RouteNotFound(format!("{} {}", method, uri.path()))
}
