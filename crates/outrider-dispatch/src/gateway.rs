//! Dispatch gateway
//!
//! Fronts the execution channel with the payload-limit precondition and
//! shapes an accepted submission into a [`DispatchResult`]. The gateway
//! never waits for the remote program; once the channel accepts the batch
//! the remote run is on its own.

use std::sync::Arc;

use outrider_batch::CommandBatch;
use outrider_common::{DispatchResult, NodeId};
use tracing::info;

use crate::channel::{ExecutionChannel, ExecutionOptions, SHELL_DOCUMENT};
use crate::error::{DispatchError, Result};

/// Documented payload cap of the command channel, in bytes.
pub const DEFAULT_PAYLOAD_LIMIT: usize = 100_000;

/// Submits command batches through an execution channel.
pub struct DispatchGateway {
    channel: Arc<dyn ExecutionChannel>,
    payload_limit: usize,
}

impl DispatchGateway {
    /// Create a gateway with the default payload limit
    pub fn new(channel: Arc<dyn ExecutionChannel>) -> Self {
        Self {
            channel,
            payload_limit: DEFAULT_PAYLOAD_LIMIT,
        }
    }

    /// Set the payload limit
    pub fn with_payload_limit(mut self, payload_limit: usize) -> Self {
        self.payload_limit = payload_limit;
        self
    }

    /// Submit a batch for asynchronous execution on a node.
    ///
    /// The payload limit is checked before the channel is called, so an
    /// oversized batch fails without any remote side effect.
    pub async fn submit(
        &self,
        node: &NodeId,
        batch: &CommandBatch,
        options: &ExecutionOptions,
    ) -> Result<DispatchResult> {
        let size = batch.serialized_len();
        if size > self.payload_limit {
            return Err(DispatchError::PayloadTooLarge {
                size,
                limit: self.payload_limit,
            });
        }

        let correlation_id = self
            .channel
            .submit(node, SHELL_DOCUMENT, batch.lines(), options)
            .await?;

        info!(node = %node, correlation_id = %correlation_id, bytes = size,
            "channel accepted batch");

        Ok(DispatchResult::new(correlation_id, node.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    struct RecordingChannel {
        submissions: AtomicU32,
    }

    impl RecordingChannel {
        fn new() -> Self {
            Self {
                submissions: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl ExecutionChannel for RecordingChannel {
        async fn submit(
            &self,
            _node: &NodeId,
            _document: &str,
            _lines: &[String],
            _options: &ExecutionOptions,
        ) -> Result<String> {
            self.submissions.fetch_add(1, Ordering::SeqCst);
            Ok("cmd-123".to_string())
        }
    }

    fn batch_of(line: &str) -> CommandBatch {
        CommandBatch::from_lines(vec![line.to_string()])
    }

    #[tokio::test]
    async fn test_submit_returns_correlation() {
        let channel = Arc::new(RecordingChannel::new());
        let gateway = DispatchGateway::new(channel.clone());

        let result = gateway
            .submit(
                &"node-7".into(),
                &batch_of("echo hi"),
                &ExecutionOptions::new(Duration::from_secs(60)),
            )
            .await
            .unwrap();

        assert_eq!(result.correlation_id, "cmd-123");
        assert_eq!(result.node_id.as_str(), "node-7");
        assert_eq!(channel.submissions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_oversized_batch_never_reaches_channel() {
        let channel = Arc::new(RecordingChannel::new());
        let gateway = DispatchGateway::new(channel.clone()).with_payload_limit(8);

        let err = gateway
            .submit(
                &"node-7".into(),
                &batch_of("echo this is too long"),
                &ExecutionOptions::new(Duration::from_secs(60)),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DispatchError::PayloadTooLarge { limit: 8, .. }
        ));
        assert_eq!(channel.submissions.load(Ordering::SeqCst), 0);
    }
}
