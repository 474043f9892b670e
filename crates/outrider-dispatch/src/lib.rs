//! Execution channel client and dispatch gateway
//!
//! The execution channel is the asynchronous remote-command mechanism: it
//! accepts a shell program addressed at a node and returns a correlation
//! identifier without waiting for the program to run. The gateway fronts
//! the channel with the one precondition the channel itself does not
//! enforce early enough (the payload size limit) and shapes the accepted
//! submission into a [`DispatchResult`].

pub mod channel;
pub mod error;
pub mod gateway;
pub mod rest;

pub use channel::{ExecutionChannel, ExecutionOptions, SHELL_DOCUMENT};
pub use error::{DispatchError, Result};
pub use gateway::{DispatchGateway, DEFAULT_PAYLOAD_LIMIT};
pub use rest::{RestChannelConfig, RestExecutionChannel};
