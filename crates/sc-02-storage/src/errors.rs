//! # Storage Errors

use shared_types::{BlockNumber, CodecError, Hash, ShardId};
use thiserror::Error;

/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors raised by storage backends and accessors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend failed an operation.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A stored value could not be decoded.
    #[error("corrupted value: {0}")]
    Codec(#[from] CodecError),

    /// A stored value has the wrong shape.
    #[error("malformed {what} in storage")]
    Malformed {
        /// What was being read
        what: &'static str,
    },

    /// A block referenced by the chain index is missing.
    #[error("block {hash} of shard {shard_id} not found")]
    MissingBlock {
        /// Shard
        shard_id: ShardId,
        /// Block hash
        hash: Hash,
    },

    /// A message trie does not form a dense index sequence.
    #[error("message trie of shard {shard_id} block {block} corrupted: {reason}")]
    TrieCorrupted {
        /// Shard
        shard_id: ShardId,
        /// Block number
        block: BlockNumber,
        /// What is wrong
        reason: String,
    },
}
