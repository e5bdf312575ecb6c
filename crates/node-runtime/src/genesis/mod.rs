//! # Genesis Module
//!
//! Writes the zerostate of every shard.
//!
//! - Block 0 of each shard: no parent, empty message roots.
//! - Non-main zerostates record the main shard's zerostate as their main
//!   chain head, which is what the first collated block of that shard sees.
//! - Configured accounts are written directly into shard state.

pub mod builder;

pub use builder::{GenesisBuilder, GenesisError, GenesisSummary};
