//! REST implementation of the execution channel client

use async_trait::async_trait;
use outrider_common::NodeId;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error};

use crate::channel::{ExecutionChannel, ExecutionOptions};
use crate::error::{DispatchError, Result};

/// Connection configuration for the command channel API
#[derive(Debug, Clone)]
pub struct RestChannelConfig {
    /// Base URL (e.g., https://channel.internal)
    pub base_url: String,
    /// Bearer token for API authentication
    pub api_token: String,
}

impl RestChannelConfig {
    /// Create a new channel config
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: api_token.into(),
        }
    }
}

/// Execution channel client over the command REST API
#[derive(Debug, Clone)]
pub struct RestExecutionChannel {
    config: RestChannelConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    command_id: String,
}

impl RestExecutionChannel {
    /// Create a new client
    pub fn new(config: RestChannelConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn commands_url(&self) -> String {
        format!("{}/v1/commands", self.config.base_url)
    }
}

#[async_trait]
impl ExecutionChannel for RestExecutionChannel {
    async fn submit(
        &self,
        node: &NodeId,
        document: &str,
        lines: &[String],
        options: &ExecutionOptions,
    ) -> Result<String> {
        let url = self.commands_url();
        debug!(node = %node, document, lines = lines.len(), "submitting command batch");

        let body = json!({
            "node_id": node,
            "document": document,
            "commands": lines,
            "timeout_seconds": options.timeout.as_secs(),
            "log_sink": options.log_sink,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| DispatchError::ChannelUnavailable(format!("submit failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            error!(node = %node, %status, "channel rejected submission");
            return Err(DispatchError::ChannelUnavailable(format!(
                "channel returned {}: {}",
                status, text
            )));
        }

        let accepted: SubmitResponse = response.json().await.map_err(|e| {
            DispatchError::ChannelUnavailable(format!("invalid submit response: {}", e))
        })?;

        Ok(accepted.command_id)
    }
}
