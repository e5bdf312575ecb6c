//! # SC-04 Collator
//!
//! Per-shard block production.
//!
//! **Architecture:** hexagonal. The collator talks to the message pool and
//! to block generation only through the ports in [`ports`]; the storage
//! backed generator and an in-memory pool live in [`adapters`].
//!
//! ## Components
//!
//! | Component | Role |
//! |-----------|------|
//! | [`Collator`] | one attempt: pool batch + neighbour messages → block |
//! | [`Scheduler`] | runs the collator on a tick, bounded per attempt |
//! | [`ReplayScheduler`] | rewinds a shard and regenerates one stored block |
//!
//! ## Cross-shard delivery
//!
//! Collators do not push messages to each other. Each attempt reads the
//! out-messages its topology neighbours committed since the previous
//! attempt; messages addressed to the shard become internal in-messages,
//! messages the topology says to relay are recorded in the shard's own
//! out-messages for the next hop to pick up.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod collator;
pub mod config;
pub mod errors;
pub mod ports;
pub mod replay;
pub mod scheduler;

pub use adapters::{InMemoryMessagePool, StateBlockGenerator, StateBlockGeneratorFactory};
pub use collator::Collator;
pub use config::{CollatorConfig, ReplayConfig};
pub use errors::{CollationError, PoolError, ReplayError, Result};
pub use ports::{BlockGenerator, BlockGeneratorFactory, GeneratedBlock, GeneratorParams, MessagePool};
pub use replay::{ReplayReport, ReplayScheduler};
pub use scheduler::{Scheduler, SchedulerState};
