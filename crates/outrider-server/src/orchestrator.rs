//! Per-workflow orchestrators
//!
//! Each workflow is the same skeleton (discover, build, ensure the node
//! is ready, dispatch), returning a [`DispatchResult`]-shaped summary as
//! soon as the channel accepts the batch. None of them observe completion;
//! the remote program runs on regardless of this process's lifetime.

use std::time::Duration;

use outrider_batch::{
    build_transfer_batch, merge_request, TrainingConfig, TrainingScript, TransferDirection,
    TransferSpec,
};
use outrider_common::{DispatchResult, NodeId, WorkUnit};
use outrider_dispatch::ExecutionOptions;
use outrider_platform::ReadinessDriver;
use outrider_storage::work_units_from_prefixes;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::error::ApiError;
use crate::AppState;

/// Workflow summary returned with HTTP 202.
#[derive(Debug, Serialize)]
pub struct WorkflowResponse {
    pub message: String,
    #[serde(flatten)]
    pub dispatch: DispatchResult,
    /// Truncated head of the generated program (bulk transfers)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_preview: Option<String>,
    /// Line count of the generated program (training)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commands_len: Option<usize>,
    /// The configuration actually scheduled, defaults included (training)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received_config: Option<TrainingConfig>,
}

/// Discover work units and dispatch a bulk transfer in the given direction.
pub async fn run_bulk_transfer(
    state: &AppState,
    direction: TransferDirection,
) -> Result<WorkflowResponse, ApiError> {
    let config = &state.config;

    let bucket = resolve_bucket(state).await?;
    let spec = TransferSpec::new(bucket)
        .with_source_prefix(&config.source_prefix)
        .with_backup_prefix(config.backup_prefix())
        .with_local_base(&config.local_data_dir);

    // Discovery happens fresh on every call; ordering is whatever the
    // listing returns.
    let discovery_prefix = spec.discovery_prefix(direction).to_string();
    let prefixes = state
        .object_store
        .list_common_prefixes(&spec.bucket, &discovery_prefix, "/")
        .await?;
    let mut units: Vec<WorkUnit> = work_units_from_prefixes(&prefixes, &discovery_prefix);
    if direction == TransferDirection::Download {
        // The backup root itself is not a dataset partition
        units.retain(|unit| unit != &config.backup_dir_name);
    }

    info!(direction = direction.as_str(), units = units.len(), "discovered work units");

    let batch = build_transfer_batch(direction, &units, &spec)?;

    let (node, timeout_secs): (&NodeId, u64) = match direction {
        TransferDirection::Download => (&config.transfer_node, config.download_timeout_secs),
        TransferDirection::Rollback => (&config.training_node, config.rollback_timeout_secs),
    };

    if direction == TransferDirection::Rollback {
        readiness(state).ensure_ready(node).await?;
    }

    let mut options = ExecutionOptions::new(Duration::from_secs(timeout_secs));
    if direction == TransferDirection::Rollback {
        options = options.with_log_sink(&config.log_sink);
    }

    let dispatch = state
        .gateway
        .submit(node, &batch, &options)
        .await?
        .with_summary(format!(
            "{} dispatched for {} units",
            direction.as_str(),
            units.len()
        ))
        .with_units(units.clone());

    let message = match direction {
        TransferDirection::Download => format!(
            "Download and backup started for {} discovered units.",
            units.len()
        ),
        TransferDirection::Rollback => {
            format!("Restore of {} backed-up units started.", units.len())
        }
    };

    Ok(WorkflowResponse {
        message,
        dispatch,
        script_preview: Some(batch.preview(100)),
        commands_len: None,
        received_config: None,
    })
}

/// Merge the request configuration, drive the training node to running,
/// and dispatch the training program.
pub async fn run_training_launch(
    state: &AppState,
    body: Option<Value>,
) -> Result<WorkflowResponse, ApiError> {
    let config = &state.config;

    let training_config = merge_request(body.as_ref())?;
    info!(mode = %training_config.training_mode, "training configuration merged");

    let script = TrainingScript::default();
    let batch = script.build(&training_config);

    let node = &config.training_node;
    readiness(state).ensure_ready(node).await?;

    // The channel timeout must exceed the remote program's own
    // execution-and-shutdown window.
    let timeout = Duration::from_secs(script.wall_clock_secs + config.dispatch_margin_secs);
    let options = ExecutionOptions::new(timeout).with_log_sink(&config.log_sink);

    let dispatch = state
        .gateway
        .submit(node, &batch, &options)
        .await?
        .with_summary(format!(
            "training launched in mode {}",
            training_config.training_mode
        ));

    Ok(WorkflowResponse {
        message: "Training program dispatched to the node.".to_string(),
        dispatch,
        script_preview: None,
        commands_len: Some(batch.len()),
        received_config: Some(training_config),
    })
}

/// The bucket name, explicit or resolved through the secret store.
async fn resolve_bucket(state: &AppState) -> Result<String, ApiError> {
    if let Some(bucket) = &state.config.bucket {
        return Ok(bucket.clone());
    }
    Ok(state
        .secrets
        .get_secret(&state.config.bucket_secret_id)
        .await?)
}

fn readiness(state: &AppState) -> ReadinessDriver {
    ReadinessDriver::new(state.platform.clone())
        .with_max_attempts(state.config.readiness_max_attempts)
        .with_poll_interval(Duration::from_secs(state.config.readiness_poll_secs))
}
