//! # Node Runtime Library
//!
//! Configuration, genesis and task supervision for the shard node. The
//! entry point is the `main.rs` binary; the library is exposed for tests.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (file, then `SC_*` environment) and validate it
//! 2. Install the log subscriber
//! 3. Write genesis: block 0 of every shard plus configured accounts
//! 4. Spawn per shard a collation scheduler (or the replay scheduler) and a
//!    block listener under one [`Runner`]
//! 5. Run until Ctrl-C or the first task failure

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod errors;
pub mod genesis;
pub mod logging;
pub mod node;
pub mod runner;

pub use config::{ConfigError, NodeConfig};
pub use errors::NodeError;
pub use genesis::{GenesisBuilder, GenesisError, GenesisSummary};
pub use logging::init_logging;
pub use node::ShardNode;
pub use runner::Runner;
