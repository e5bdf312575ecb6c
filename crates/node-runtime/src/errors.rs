//! Node-level errors

use crate::config::ConfigError;
use crate::genesis::GenesisError;
use sc_02_storage::StorageError;
use sc_04_collator::{CollationError, ReplayError};
use sc_05_block_propagation::PropagationError;
use thiserror::Error;

/// Anything that stops the node.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Genesis could not be written.
    #[error("genesis error: {0}")]
    Genesis(#[from] GenesisError),

    /// Storage failed outside a shard task.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A collation scheduler stopped with an error.
    #[error("collation error: {0}")]
    Collation(#[from] CollationError),

    /// The replay scheduler stopped with an error.
    #[error("replay error: {0}")]
    Replay(#[from] ReplayError),

    /// A block listener stopped with an error.
    #[error("propagation error: {0}")]
    Propagation(#[from] PropagationError),

    /// A task panicked or was aborted.
    #[error("task {name} failed: {reason}")]
    TaskFailed {
        /// Task name.
        name: String,
        /// Join error.
        reason: String,
    },

    /// The log subscriber could not be installed.
    #[error("logging setup failed: {0}")]
    Logging(String),
}
