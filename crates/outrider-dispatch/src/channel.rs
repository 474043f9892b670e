//! Execution channel trait

use std::time::Duration;

use async_trait::async_trait;
use outrider_common::NodeId;

use crate::error::Result;

/// Document type for an inline shell program submission.
pub const SHELL_DOCUMENT: &str = "run-shell-script";

/// Per-submission parameters.
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    /// How long the channel lets the remote program run before it marks
    /// the command failed. Must exceed the program's own internal bound.
    pub timeout: Duration,
    /// Named log group the channel streams remote output into
    pub log_sink: Option<String>,
}

impl ExecutionOptions {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            log_sink: None,
        }
    }

    /// Stream remote output into a named log group
    pub fn with_log_sink(mut self, sink: impl Into<String>) -> Self {
        self.log_sink = Some(sink.into());
        self
    }
}

/// Trait for asynchronous remote-command submission
///
/// Implementations hand the program to the platform's command channel and
/// return as soon as the submission is accepted; completion is observed
/// out-of-band, never through this trait.
#[async_trait]
pub trait ExecutionChannel: Send + Sync {
    /// Submit a shell program for execution on a node.
    ///
    /// Returns the correlation identifier the channel assigned to the
    /// submission.
    async fn submit(
        &self,
        node: &NodeId,
        document: &str,
        lines: &[String],
        options: &ExecutionOptions,
    ) -> Result<String>;
}
