//! # Topology Errors

use thiserror::Error;

/// Topology configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopologyError {
    /// The topology identifier names no known topology.
    #[error("unknown shard topology: {0:?}")]
    UnknownTopology(String),
}
