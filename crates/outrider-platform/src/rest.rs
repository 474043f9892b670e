//! REST implementation of the compute platform client
//!
//! Talks to the fleet control-plane API with bearer-token authentication.
//! The API surface consumed here is deliberately small: describe a node,
//! request a start.

use async_trait::async_trait;
use outrider_common::{NodeId, NodeState};
use serde::Deserialize;
use tracing::{debug, error};

use crate::error::{PlatformError, Result};
use crate::platform::ComputePlatform;

/// Connection configuration for the control-plane API
#[derive(Debug, Clone)]
pub struct RestPlatformConfig {
    /// Base URL (e.g., https://platform.internal)
    pub base_url: String,
    /// Bearer token for API authentication
    pub api_token: String,
}

impl RestPlatformConfig {
    /// Create a new platform config
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: api_token.into(),
        }
    }
}

/// Compute platform client over the control-plane REST API
#[derive(Debug, Clone)]
pub struct RestComputePlatform {
    config: RestPlatformConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct DescribeResponse {
    state: String,
}

impl RestComputePlatform {
    /// Create a new client
    pub fn new(config: RestPlatformConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn node_url(&self, node: &NodeId) -> String {
        format!("{}/v1/nodes/{}", self.config.base_url, node)
    }
}

#[async_trait]
impl ComputePlatform for RestComputePlatform {
    async fn describe(&self, node: &NodeId) -> Result<NodeState> {
        let url = self.node_url(node);
        debug!(node = %node, url = %url, "describing node");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_token)
            .send()
            .await
            .map_err(|e| PlatformError::Api(format!("describe request failed: {}", e)))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(PlatformError::NodeNotFound(node.to_string()));
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(node = %node, %status, "describe returned non-success status");
            return Err(PlatformError::Api(format!(
                "describe returned {}: {}",
                status, body
            )));
        }

        let described: DescribeResponse = response
            .json()
            .await
            .map_err(|e| PlatformError::Api(format!("invalid describe response: {}", e)))?;

        Ok(NodeState::parse(&described.state))
    }

    async fn start(&self, node: &NodeId) -> Result<()> {
        let url = format!("{}/start", self.node_url(node));
        debug!(node = %node, url = %url, "requesting node start");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_token)
            .send()
            .await
            .map_err(|e| PlatformError::Api(format!("start request failed: {}", e)))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(PlatformError::NodeNotFound(node.to_string()));
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(node = %node, %status, "start returned non-success status");
            return Err(PlatformError::Api(format!(
                "start returned {}: {}",
                status, body
            )));
        }

        Ok(())
    }
}
