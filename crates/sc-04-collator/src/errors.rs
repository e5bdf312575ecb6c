//! Error types for collation and replay

use sc_02_storage::StorageError;
use sc_03_execution::{HandlerError, StateError};
use shared_types::{BlockNumber, ShardId};
use std::time::Duration;
use thiserror::Error;

/// Result type alias for collation operations
pub type Result<T> = std::result::Result<T, CollationError>;

/// Errors from the message pool port
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// The pool is at capacity
    #[error("pool full: capacity {capacity}")]
    Full {
        /// Maximum number of messages
        capacity: usize,
    },

    /// The message is already pooled
    #[error("message already in pool")]
    Duplicate,

    /// The pool is unavailable
    #[error("pool unavailable: {0}")]
    Unavailable(String),
}

/// Errors that abort a collation attempt
#[derive(Debug, Error)]
pub enum CollationError {
    /// Storage failed
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Execution state failed
    #[error("state error: {0}")]
    State(#[from] StateError),

    /// The message batch was aborted
    #[error("message handling failed: {0}")]
    Handler(#[from] HandlerError),

    /// The message pool failed
    #[error("pool error: {0}")]
    Pool(#[from] PoolError),

    /// The shard has no head block (genesis missing)
    #[error("shard {0} has no head block")]
    MissingHead(ShardId),

    /// A generator was asked to generate twice
    #[error("block generator already used")]
    GeneratorSpent,

    /// A collation attempt exceeded its deadline
    #[error("collation of shard {shard_id} timed out after {after:?}")]
    Timeout {
        /// Shard
        shard_id: ShardId,
        /// Attempt deadline
        after: Duration,
    },
}

/// Errors from block replay
#[derive(Debug, Error)]
pub enum ReplayError {
    /// The main shard cannot be replayed
    #[error("replay of the main shard is not supported")]
    MainShard,

    /// Block zero has no predecessor to replay from
    #[error("cannot replay zerostate-block of shard {0}")]
    ZeroStateBlock(ShardId),

    /// A block the replay needs is not stored
    #[error("block {block} of shard {shard_id} not found")]
    BlockNotFound {
        /// Shard
        shard_id: ShardId,
        /// Block number
        block: BlockNumber,
    },

    /// Storage failed
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Reverting account state failed
    #[error("state error: {0}")]
    State(#[from] StateError),

    /// Regenerating the block failed
    #[error("regeneration failed: {0}")]
    Collation(#[from] CollationError),
}
