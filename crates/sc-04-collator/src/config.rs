//! Configuration types for collation and replay

use sc_01_topology::ShardTopology;
use shared_types::{Address, BlockNumber, ShardId, MAIN_WALLET_ADDRESS};
use std::time::Duration;

/// Default collation tick.
pub const DEFAULT_COLLATOR_TICK: Duration = Duration::from_millis(2_000);

/// Default bound on one collation or replay attempt.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Default number of pool messages per block.
pub const DEFAULT_MAX_BATCH: usize = 100;

/// Runtime configuration of one shard's collator
#[derive(Clone, Debug)]
pub struct CollatorConfig {
    /// Shard being collated
    pub shard_id: ShardId,

    /// Total number of shards
    pub n_shards: u16,

    /// Cross-shard topology
    pub topology: ShardTopology,

    /// Interval between collation attempts
    pub tick: Duration,

    /// Bound on one attempt
    pub attempt_timeout: Duration,

    /// Maximum pool messages per block
    pub max_batch: usize,

    /// Only sender allowed to deploy onto the main shard
    pub system_wallet: Address,
}

impl CollatorConfig {
    /// Defaults for `shard_id` out of `n_shards`.
    pub fn new(shard_id: ShardId, n_shards: u16) -> Self {
        Self {
            shard_id,
            n_shards,
            topology: ShardTopology::default(),
            tick: DEFAULT_COLLATOR_TICK,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            max_batch: DEFAULT_MAX_BATCH,
            system_wallet: MAIN_WALLET_ADDRESS,
        }
    }
}

/// What to replay
#[derive(Clone, Debug)]
pub struct ReplayConfig {
    /// Shard whose block is replayed
    pub shard_id: ShardId,

    /// Block to regenerate
    pub block: BlockNumber,

    /// Bound on the regeneration
    pub attempt_timeout: Duration,
}

impl ReplayConfig {
    /// Replay `block` of `shard_id` with the default timeout.
    pub fn new(shard_id: ShardId, block: BlockNumber) -> Self {
        Self {
            shard_id,
            block,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }
}
