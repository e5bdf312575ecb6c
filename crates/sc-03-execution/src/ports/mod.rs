//! Ports: what the message handler requires from its environment.

pub mod outbound;

pub use outbound::{ExecutionState, OutMessageLookup};
