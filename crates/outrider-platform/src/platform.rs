//! Compute platform trait

use async_trait::async_trait;
use outrider_common::{NodeId, NodeState};

use crate::error::Result;

/// Trait for compute control-plane operations
///
/// Implementations handle the platform-specific transport; the orchestrator
/// only ever observes state and requests a start.
#[async_trait]
pub trait ComputePlatform: Send + Sync {
    /// Get the current lifecycle state of a node
    ///
    /// Fails with `NodeNotFound` when the node is absent from the
    /// platform's inventory.
    async fn describe(&self, node: &NodeId) -> Result<NodeState>;

    /// Request that a stopped node be started
    ///
    /// Returns as soon as the platform accepts the request; the node
    /// transitions through `Pending` on its own time.
    async fn start(&self, node: &NodeId) -> Result<()>;
}
