//! Deterministic shell program generation
//!
//! This crate turns a workflow configuration into a `CommandBatch`: an
//! ordered shell program dispatched to a remote node as one atomic channel
//! submission. Construction is pure (no I/O, no clocks), so identical
//! input always yields a byte-identical program.
//!
//! # Builders
//!
//! - **Bulk transfer**: per-unit stage/backup command groups (or the
//!   inverse restore), joined conjunctively into a single program line.
//! - **Training launch**: a self-contained script that prepares the node's
//!   environment, exports every configuration field with an
//!   override-friendly fallback, runs training under a wall-clock bound,
//!   and optionally powers the node off afterwards.
//!
//! # Example
//!
//! ```
//! use outrider_batch::{TrainingScript, TrainingConfig};
//!
//! let script = TrainingScript::default();
//! let batch = script.build(&TrainingConfig::default());
//! assert!(batch.joined().contains("export BATCH_SIZE=${BATCH_SIZE:-512}"));
//! ```

pub mod batch;
pub mod error;
pub mod training;
pub mod transfer;

pub use batch::CommandBatch;
pub use error::{BatchError, Result};
pub use training::{merge_request, mode_defaults, TrainingConfig, TrainingScript};
pub use transfer::{build_transfer_batch, TransferDirection, TransferSpec};
