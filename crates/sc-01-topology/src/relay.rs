//! # Relay Simulation
//!
//! Follows a cross-shard message through a topology the way collators do:
//! every neighbour of a holder reads the holder's outbound messages, accepts
//! the ones addressed to itself and relays the ones the topology says to
//! relay. A shard relays a given message at most once.

use crate::topology::ShardTopology;
use shared_types::ShardId;
use std::collections::BTreeSet;

/// Outcome of following one message from its origin shard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayTrace {
    /// Hop count at which the destination first received the message.
    pub delivered_after: Option<usize>,
    /// Shards that relayed the message, in the order they did.
    pub relays: Vec<ShardId>,
    /// Number of hops simulated before no shard had anything left to relay.
    pub hops: usize,
}

/// Traces a message emitted by `origin` for `dest`.
#[must_use]
pub fn trace_relay(
    topology: ShardTopology,
    origin: ShardId,
    dest: ShardId,
    n_shards: u16,
) -> RelayTrace {
    let mut trace = RelayTrace {
        delivered_after: None,
        relays: Vec::new(),
        hops: 0,
    };
    if origin == dest {
        trace.delivered_after = Some(0);
        return trace;
    }

    let mut seen = BTreeSet::from([origin]);
    let mut holders = vec![origin];

    while !holders.is_empty() {
        trace.hops += 1;
        let mut next = Vec::new();
        for holder in holders {
            for neighbour in topology.neighbours(holder, n_shards) {
                if neighbour == dest {
                    trace.delivered_after.get_or_insert(trace.hops);
                } else if topology.should_propagate_msg(holder, neighbour, dest)
                    && seen.insert(neighbour)
                {
                    trace.relays.push(neighbour);
                    next.push(neighbour);
                }
            }
        }
        holders = next;
    }
    trace
}
