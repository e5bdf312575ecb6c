//! # SC-01 Shard Topology
//!
//! Routing policy between shards.
//!
//! **Architecture:** pure domain logic, no I/O.
//!
//! ## Purpose
//!
//! Decide which shards are a shard's direct neighbours (whose outbound
//! messages it reads during collation) and whether a cross-shard message it
//! received from a neighbour must be relayed further.
//!
//! | Topology | Neighbours | Relaying |
//! |----------|------------|----------|
//! | `Neighbouring` | `id-1`, `id+1` on a ring | while travelling in one direction |
//! | `Trivial` | every other shard | never |
//!
//! ## Termination
//!
//! A ring relay only continues when the relaying shard lies strictly between
//! the previous hop and the destination, so every hop moves the message
//! closer and relaying stops after at most `n_shards` hops.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod relay;
pub mod topology;

pub use errors::TopologyError;
pub use relay::{trace_relay, RelayTrace};
pub use topology::ShardTopology;
