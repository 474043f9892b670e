//! Compute platform client and node readiness driver
//!
//! This crate talks to the compute control plane: it observes a node's
//! lifecycle state, requests a start when the node is stopped, and drives
//! the node to the running state before any dispatch happens.
//!
//! The readiness loop is the only part of the orchestrator with real retry
//! semantics: a bounded polling state machine with a constant interval and
//! an at-most-one start request per call.
//!
//! # Example
//!
//! ```ignore
//! use outrider_platform::{ReadinessDriver, RestComputePlatform, RestPlatformConfig};
//! use std::sync::Arc;
//!
//! let platform = Arc::new(RestComputePlatform::new(
//!     RestPlatformConfig::new("https://platform.internal", "token"),
//! ));
//! let driver = ReadinessDriver::new(platform);
//! driver.ensure_ready(&"node-7".into()).await?;
//! ```

pub mod error;
pub mod platform;
pub mod readiness;
pub mod rest;

pub use error::{PlatformError, Result};
pub use platform::ComputePlatform;
pub use readiness::{PollAttempt, ReadinessDriver};
pub use rest::{RestComputePlatform, RestPlatformConfig};
