//! # Driven Ports (SPI - Outbound)
//!
//! - [`MessagePool`]: pending messages addressed to the shard.
//! - [`BlockGeneratorFactory`] / [`BlockGenerator`]: turns a [`Proposal`]
//!   into a committed block.

use crate::errors::{PoolError, Result};
use async_trait::async_trait;
use sc_03_execution::HandleSummary;
use shared_types::{Block, Hash, Message, Proposal, ShardId};

type PoolResult<T> = std::result::Result<T, PoolError>;

/// Pending messages of one shard.
///
/// Shared with whatever feeds it; the collator only ever goes through this
/// interface.
#[async_trait]
pub trait MessagePool: Send + Sync {
    /// Up to `max_count` messages, oldest first, starting at pool sequence
    /// number `since_seqno`. Non-destructive.
    async fn peek(&self, max_count: usize, since_seqno: u64) -> PoolResult<Vec<Message>>;

    /// Retires `committed` messages included in `block`.
    ///
    /// `dropped` messages could not buy gas; the pool decides whether to
    /// retry or evict them.
    async fn on_new_block(
        &self,
        block: &Block,
        committed: &[Message],
        dropped: Option<&[Hash]>,
    ) -> PoolResult<()>;

    /// Evicts messages that can never be included.
    async fn reject(&self, hashes: &[Hash]) -> PoolResult<()>;
}

/// Per-attempt generator parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorParams {
    /// Shard the block is produced for.
    pub shard_id: ShardId,
}

/// A block produced and committed by a generator.
#[derive(Debug, Clone)]
pub struct GeneratedBlock {
    /// The block.
    pub block: Block,
    /// Its hash.
    pub hash: Hash,
    /// In-messages that received a receipt, in order.
    pub committed: Vec<Hash>,
    /// In-messages dropped for lack of gas funds.
    pub dropped: Vec<Hash>,
    /// Out-messages recorded by the block.
    pub out_messages: Vec<Message>,
    /// Batch outcome counts.
    pub summary: HandleSummary,
}

/// Builds one block inside its own read-write transaction.
///
/// Dropping a generator that has not committed rolls its transaction back.
#[async_trait]
pub trait BlockGenerator: Send {
    /// Executes `proposal` and commits the resulting block.
    async fn generate_block(&mut self, proposal: &Proposal) -> Result<GeneratedBlock>;

    /// Discards the transaction if it was not committed. Idempotent.
    fn rollback(&mut self);
}

/// Creates a fresh generator per attempt.
pub trait BlockGeneratorFactory: Send + Sync {
    /// Opens a generator and its transaction.
    fn new_generator(&self, params: GeneratorParams) -> Result<Box<dyn BlockGenerator>>;
}
