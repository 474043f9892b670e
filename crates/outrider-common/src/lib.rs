//! Shared models for the outrider orchestrator
//!
//! This crate holds the wire-level value types passed between the
//! orchestration components: node identity and lifecycle state, discovered
//! work units, dispatch results, and the JSON error envelope.

pub mod models;

pub use models::*;
