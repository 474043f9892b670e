use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a remote compute node.
///
/// Supplied by configuration; never created or destroyed by this system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Lifecycle state of a compute node as observed from the platform.
///
/// Mutated only by the platform itself; this system observes it and may
/// request a start, nothing else. States outside the known set are carried
/// verbatim in `Unknown` so the caller can report what the platform said.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeState {
    /// Node is powered off
    Stopped,
    /// Node is starting up
    Pending,
    /// Node is up and reachable
    Running,
    /// Node is shutting down
    Stopping,
    /// Any state outside the known set
    Unknown(String),
}

impl NodeState {
    /// Parse a platform-reported state string.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "stopped" => NodeState::Stopped,
            "pending" => NodeState::Pending,
            "running" => NodeState::Running,
            "stopping" => NodeState::Stopping,
            other => NodeState::Unknown(other.to_string()),
        }
    }

    /// Whether the state resolves on its own and should be re-polled.
    pub fn is_transitional(&self) -> bool {
        matches!(self, NodeState::Pending | NodeState::Stopping)
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeState::Stopped => write!(f, "stopped"),
            NodeState::Pending => write!(f, "pending"),
            NodeState::Running => write!(f, "running"),
            NodeState::Stopping => write!(f, "stopping"),
            NodeState::Unknown(raw) => write!(f, "{}", raw),
        }
    }
}

/// A discovered partition of the dataset, named after its storage prefix.
pub type WorkUnit = String;

/// Outcome of one accepted channel submission.
///
/// Created when the execution channel accepts a batch; the remote program
/// runs asynchronously and its completion is never observed here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchResult {
    /// Correlation identifier assigned by the execution channel
    pub correlation_id: String,
    /// Node the batch was dispatched to
    pub node_id: NodeId,
    /// Human-readable summary of what was scheduled
    pub summary: String,
    /// Work units covered by the batch, in batch order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub units_processed: Vec<WorkUnit>,
}

impl DispatchResult {
    pub fn new(correlation_id: impl Into<String>, node_id: NodeId) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            node_id,
            summary: String::new(),
            units_processed: Vec::new(),
        }
    }

    /// Set the workflow summary
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Set the processed unit list
    pub fn with_units(mut self, units: Vec<WorkUnit>) -> Self {
        self.units_processed = units;
        self
    }
}

/// JSON error envelope returned by the HTTP surface.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            timestamp: Utc::now(),
        }
    }
}
