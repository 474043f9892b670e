//! Server configuration
//!
//! Everything is environment-driven with workable defaults; the bucket
//! name may instead be resolved through the secret store at request time
//! when `OUTRIDER_BUCKET` is unset.

use std::env;
use std::str::FromStr;

use outrider_common::NodeId;
use outrider_dispatch::DEFAULT_PAYLOAD_LIMIT;

/// Runtime configuration for the orchestrator service.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub port: u16,

    /// Compute control-plane API base URL
    pub platform_url: String,
    /// Command channel API base URL
    pub channel_url: String,
    /// Object storage API base URL
    pub storage_url: String,
    /// Secret store API base URL
    pub secrets_url: String,
    /// Bearer token shared by the collaborator APIs
    pub api_token: String,

    /// Dataset bucket; when unset it is resolved via `bucket_secret_id`
    pub bucket: Option<String>,
    /// Secret identifier holding the bucket name
    pub bucket_secret_id: String,

    /// Node bulk downloads are staged onto
    pub transfer_node: NodeId,
    /// Node training runs on (also the rollback target)
    pub training_node: NodeId,

    /// Prefix the live dataset lives under
    pub source_prefix: String,
    /// Unit name the backups live under, nested in `source_prefix`
    pub backup_dir_name: String,
    /// Directory on the node the dataset is staged into
    pub local_data_dir: String,

    /// Named log group remote output is streamed into
    pub log_sink: String,
    /// Channel payload cap in bytes
    pub payload_limit: usize,

    /// Readiness loop attempt ceiling
    pub readiness_max_attempts: u32,
    /// Readiness loop poll interval in seconds
    pub readiness_poll_secs: u64,

    /// Channel timeout for the download workflow, seconds
    pub download_timeout_secs: u64,
    /// Channel timeout for the rollback workflow, seconds
    pub rollback_timeout_secs: u64,
    /// Margin added above the training program's wall clock for the
    /// channel timeout, seconds
    pub dispatch_margin_secs: u64,
}

impl ServerConfig {
    /// Load configuration from `OUTRIDER_*` environment variables.
    pub fn from_env() -> Self {
        Self {
            port: env_parse("OUTRIDER_PORT", 3000),
            platform_url: env_or("OUTRIDER_PLATFORM_URL", "http://127.0.0.1:8601"),
            channel_url: env_or("OUTRIDER_CHANNEL_URL", "http://127.0.0.1:8602"),
            storage_url: env_or("OUTRIDER_STORAGE_URL", "http://127.0.0.1:8603"),
            secrets_url: env_or("OUTRIDER_SECRETS_URL", "http://127.0.0.1:8604"),
            api_token: env_or("OUTRIDER_API_TOKEN", ""),
            bucket: env::var("OUTRIDER_BUCKET").ok().filter(|b| !b.is_empty()),
            bucket_secret_id: env_or("OUTRIDER_BUCKET_SECRET_ID", "bucket"),
            transfer_node: NodeId::new(env_or("OUTRIDER_TRANSFER_NODE", "node-data-1")),
            training_node: NodeId::new(env_or("OUTRIDER_TRAINING_NODE", "node-gpu-1")),
            source_prefix: env_or("OUTRIDER_SOURCE_PREFIX", "csv/"),
            backup_dir_name: env_or("OUTRIDER_BACKUP_DIR", "backup"),
            local_data_dir: env_or(
                "OUTRIDER_LOCAL_DATA_DIR",
                "/home/ubuntu/trainer/data/csv/",
            ),
            log_sink: env_or("OUTRIDER_LOG_SINK", "/jobs/training"),
            payload_limit: env_parse("OUTRIDER_PAYLOAD_LIMIT", DEFAULT_PAYLOAD_LIMIT),
            readiness_max_attempts: env_parse("OUTRIDER_READINESS_ATTEMPTS", 15),
            readiness_poll_secs: env_parse("OUTRIDER_READINESS_POLL_SECS", 10),
            download_timeout_secs: env_parse("OUTRIDER_DOWNLOAD_TIMEOUT_SECS", 3600),
            rollback_timeout_secs: env_parse("OUTRIDER_ROLLBACK_TIMEOUT_SECS", 60),
            dispatch_margin_secs: env_parse("OUTRIDER_DISPATCH_MARGIN_SECS", 300),
        }
    }

    /// Full prefix the backups live under (e.g. `csv/backup/`).
    pub fn backup_prefix(&self) -> String {
        format!("{}{}/", self.source_prefix, self.backup_dir_name)
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: FromStr + Copy>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
