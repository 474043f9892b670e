//! Object storage discovery
//!
//! Only the listing side of object storage is consumed by this process;
//! the actual file transfers run remotely inside the generated shell
//! program.

use async_trait::async_trait;
use outrider_common::WorkUnit;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Result, StorageError};

/// Trait for object storage listing
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List the common prefixes directly under `prefix`.
    ///
    /// Returned prefixes carry the full path including `prefix` itself
    /// (e.g. `csv/agua/`), in whatever order the storage listing yields.
    /// Ordering is not guaranteed stable across invocations.
    async fn list_common_prefixes(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: &str,
    ) -> Result<Vec<String>>;
}

/// Normalize listed prefixes into work unit names.
///
/// Strips the base prefix and the trailing delimiter, dropping entries
/// that normalize to nothing (`csv/agua/` under `csv/` becomes `agua`).
pub fn work_units_from_prefixes(prefixes: &[String], base_prefix: &str) -> Vec<WorkUnit> {
    prefixes
        .iter()
        .map(|p| {
            p.strip_prefix(base_prefix)
                .unwrap_or(p)
                .trim_end_matches('/')
                .to_string()
        })
        .filter(|unit| !unit.is_empty())
        .collect()
}

/// Connection configuration for the storage API
#[derive(Debug, Clone)]
pub struct RestStorageConfig {
    /// Base URL (e.g., https://storage.internal)
    pub base_url: String,
    /// Bearer token for API authentication
    pub api_token: String,
}

impl RestStorageConfig {
    /// Create a new storage config
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: api_token.into(),
        }
    }
}

/// Object storage client over the storage REST API
#[derive(Debug, Clone)]
pub struct RestObjectStore {
    config: RestStorageConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    common_prefixes: Vec<String>,
}

impl RestObjectStore {
    /// Create a new client
    pub fn new(config: RestStorageConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn list_url(&self, bucket: &str) -> String {
        format!("{}/v1/buckets/{}/prefixes", self.config.base_url, bucket)
    }
}

#[async_trait]
impl ObjectStore for RestObjectStore {
    async fn list_common_prefixes(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: &str,
    ) -> Result<Vec<String>> {
        let url = self.list_url(bucket);
        debug!(bucket, prefix, "listing common prefixes");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_token)
            .query(&[("prefix", prefix), ("delimiter", delimiter)])
            .send()
            .await
            .map_err(|e| StorageError::List(format!("list request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::List(format!(
                "listing returned {}: {}",
                status, body
            )));
        }

        let listed: ListResponse = response
            .json()
            .await
            .map_err(|e| StorageError::List(format!("invalid list response: {}", e)))?;

        info!(bucket, prefix, found = listed.common_prefixes.len(), "listed common prefixes");
        Ok(listed.common_prefixes)
    }
}
