//! # Topics
//!
//! Names of the network topics shard components publish on.

use shared_types::ShardId;
use std::fmt;

/// A network topic name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Topic(String);

impl Topic {
    /// Creates a topic from an arbitrary name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Topic finalized blocks of `shard_id` are distributed on.
    #[must_use]
    pub fn shard_blocks(shard_id: ShardId) -> Self {
        Self(format!("shard/{shard_id}/blocks"))
    }

    /// The topic name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
