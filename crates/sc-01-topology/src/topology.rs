//! # Shard Topologies

use crate::errors::TopologyError;
use shared_types::ShardId;
use std::fmt;
use std::str::FromStr;

/// Routing policy between shards.
///
/// Selected once at start-up from a string identifier with
/// [`ShardTopology::from_id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShardTopology {
    /// Ring: each shard neighbours the shards on either side of it.
    #[default]
    Neighbouring,
    /// Fully connected: every shard neighbours every other shard.
    Trivial,
}

impl ShardTopology {
    /// Identifier of the ring topology.
    pub const NEIGHBOURING_ID: &'static str = "NeighbouringShardTopology";

    /// Identifier of the fully connected topology.
    pub const TRIVIAL_ID: &'static str = "TrivialShardTopology";

    /// Selects a topology by identifier.
    ///
    /// Accepts the full identifiers and their short lowercase aliases
    /// (`neighbouring`, `trivial`).
    pub fn from_id(id: &str) -> Result<Self, TopologyError> {
        match id {
            Self::NEIGHBOURING_ID | "neighbouring" => Ok(Self::Neighbouring),
            Self::TRIVIAL_ID | "trivial" => Ok(Self::Trivial),
            other => Err(TopologyError::UnknownTopology(other.to_string())),
        }
    }

    /// The topology's identifier.
    #[must_use]
    pub fn id(&self) -> &'static str {
        match self {
            Self::Neighbouring => Self::NEIGHBOURING_ID,
            Self::Trivial => Self::TRIVIAL_ID,
        }
    }

    /// Direct neighbours of `shard_id` among `n_shards` shards, ascending,
    /// never including `shard_id` itself.
    #[must_use]
    pub fn neighbours(&self, shard_id: ShardId, n_shards: u16) -> Vec<ShardId> {
        if n_shards <= 1 {
            return Vec::new();
        }
        match self {
            Self::Neighbouring => {
                let n = u32::from(n_shards);
                let id = u32::from(shard_id) % n;
                let prev = ((id + n - 1) % n) as ShardId;
                let next = ((id + 1) % n) as ShardId;
                let mut neighbours = vec![prev, next];
                neighbours.sort_unstable();
                neighbours.dedup();
                neighbours
            }
            Self::Trivial => (0..n_shards).filter(|&id| id != shard_id).collect(),
        }
    }

    /// Whether a message received by `to` from neighbour `from`, bound for
    /// `dest`, must be relayed further.
    ///
    /// On the ring the message keeps moving only while it travels in one
    /// direction: `(from < to) == (to < dest)`.
    #[must_use]
    pub fn should_propagate_msg(&self, from: ShardId, to: ShardId, dest: ShardId) -> bool {
        match self {
            Self::Neighbouring => (from < to) == (to < dest),
            Self::Trivial => false,
        }
    }
}

impl FromStr for ShardTopology {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s)
    }
}

impl fmt::Display for ShardTopology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
