//! # SC-05 Block Propagation
//!
//! Each shard publishes the blocks it produces on `shard/<id>/blocks` and
//! runs a listener on the same topic. Received blocks are decoded and
//! logged; they are not persisted.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod listener;
pub mod publisher;

pub use errors::PropagationError;
pub use listener::BlockListener;
pub use publisher::BlockPublisher;
