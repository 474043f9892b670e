//! Node readiness driver
//!
//! A bounded polling state machine that drives a compute node from stopped
//! to running before any batch is dispatched to it:
//!
//! ```text
//! Stopped ──(one start request)──▶ Pending ──▶ Running   (success)
//!    ▲                               │
//!    └── Stopping ◀──────────────────┘         (transitional, re-poll)
//! any other observed state                     (terminal failure)
//! ```
//!
//! The loop polls at a constant interval with a fixed attempt ceiling; no
//! backoff. At most one start request is issued per call, even if the node
//! is observed stopped again later in the loop.

use std::sync::Arc;
use std::time::Duration;

use outrider_common::{NodeId, NodeState};
use tracing::{debug, info, warn};

use crate::error::{PlatformError, Result};
use crate::platform::ComputePlatform;

/// Default attempt ceiling for one `ensure_ready` call.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 15;

/// Default sleep between transitional observations.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// One polling iteration, kept for logging only.
#[derive(Debug, Clone)]
pub struct PollAttempt {
    /// 1-based attempt number
    pub attempt: u32,
    /// State observed on this attempt
    pub observed: NodeState,
    /// When the observation was made
    pub at: chrono::DateTime<chrono::Utc>,
}

/// Drives a node to the running state by polling the compute platform.
pub struct ReadinessDriver {
    platform: Arc<dyn ComputePlatform>,
    max_attempts: u32,
    poll_interval: Duration,
}

impl ReadinessDriver {
    /// Create a driver with the default attempt ceiling and interval
    pub fn new(platform: Arc<dyn ComputePlatform>) -> Self {
        Self {
            platform,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Set the attempt ceiling
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the sleep between transitional observations
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Ensure the node is in the running state, starting it if necessary.
    ///
    /// Terminal outcomes:
    /// - `Ok(())` on the first `Running` observation
    /// - `NodeNotFound` if the node is absent (no retry)
    /// - `NodeState` on an unrecognized state (no retry)
    /// - `ReadyTimeout` when the attempt ceiling is exhausted
    pub async fn ensure_ready(&self, node: &NodeId) -> Result<()> {
        let mut start_issued = false;

        for attempt in 1..=self.max_attempts {
            let observed = self.platform.describe(node).await?;
            let poll = PollAttempt {
                attempt,
                observed: observed.clone(),
                at: chrono::Utc::now(),
            };
            debug!(node = %node, attempt = poll.attempt, state = %poll.observed,
                at = %poll.at, "polled node state");

            match observed {
                NodeState::Running => {
                    info!(node = %node, attempt, "node is running");
                    return Ok(());
                }
                NodeState::Stopped if !start_issued => {
                    info!(node = %node, "node is stopped, requesting start");
                    self.platform.start(node).await?;
                    start_issued = true;
                    // The start call consumed this attempt; treat the node
                    // as pending and poll again without the raw re-read.
                }
                NodeState::Stopped | NodeState::Pending | NodeState::Stopping => {
                    debug!(node = %node, state = %poll.observed, interval = ?self.poll_interval,
                        "node in transitional state, waiting");
                    tokio::time::sleep(self.poll_interval).await;
                }
                NodeState::Unknown(raw) => {
                    warn!(node = %node, state = %raw, "node in unusable state");
                    return Err(PlatformError::NodeState {
                        node: node.to_string(),
                        state: raw,
                    });
                }
            }
        }

        warn!(node = %node, attempts = self.max_attempts, "node never reached running");
        Err(PlatformError::ReadyTimeout {
            node: node.to_string(),
            attempts: self.max_attempts,
        })
    }
}
