//! # Storage Ports
//!
//! These traits are the interface collation, execution and replay require
//! from the storage engine.
//!
//! Production: a persistent transactional KV engine.
//! Testing and single-process nodes: [`crate::MemoryStorage`].

use crate::errors::Result;
use shared_types::ShardId;

/// Logical tables.
///
/// Every table is sharded: keys live under a shard id. `get`/`put` without
/// a shard address the shared namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Table {
    /// Block hash → encoded block.
    Blocks,
    /// Block number → block hash.
    BlockHashByNumber,
    /// Singleton → hash of the shard's current head.
    LastBlock,
    /// (block, index) → encoded in-message.
    InMessages,
    /// In-message hash → block number it was executed in.
    InMessageIndex,
    /// (block, index) → encoded out-message.
    OutMessages,
    /// Out-message hash → encoded out-message.
    OutMessageIndex,
    /// (block, index) → encoded receipt.
    Receipts,
    /// Address → encoded account state.
    Accounts,
    /// Neighbour shard id → last neighbour block consumed.
    NeighbourCursors,
    /// (block, address) → account state before the block changed it.
    AccountJournal,
    /// (block, neighbour) → neighbour cursor before the block advanced it.
    CursorJournal,
}

/// Read-only transaction.
pub trait RoTx: Send {
    /// Reads a key from the shared namespace of `table`.
    fn get(&self, table: Table, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Reads a key from `shard_id`'s part of `table`.
    fn get_from_shard(&self, shard_id: ShardId, table: Table, key: &[u8])
        -> Result<Option<Vec<u8>>>;

    /// Entries of `shard_id`'s part of `table` whose key starts with
    /// `prefix`, in key order.
    fn scan_shard(
        &self,
        shard_id: ShardId,
        table: Table,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;

    /// Whether a key exists in the shared namespace of `table`.
    fn exists(&self, table: Table, key: &[u8]) -> Result<bool> {
        Ok(self.get(table, key)?.is_some())
    }

    /// Whether a key exists in `shard_id`'s part of `table`.
    fn exists_in_shard(&self, shard_id: ShardId, table: Table, key: &[u8]) -> Result<bool> {
        Ok(self.get_from_shard(shard_id, table, key)?.is_some())
    }
}

/// Read-write transaction.
///
/// Reads observe the transaction's own writes. Writes become visible to
/// other transactions only on [`RwTx::commit`]; dropping the transaction
/// rolls it back.
pub trait RwTx: RoTx {
    /// Writes a key into the shared namespace of `table`.
    fn put(&mut self, table: Table, key: &[u8], value: Vec<u8>) -> Result<()>;

    /// Writes a key into `shard_id`'s part of `table`.
    fn put_to_shard(
        &mut self,
        shard_id: ShardId,
        table: Table,
        key: &[u8],
        value: Vec<u8>,
    ) -> Result<()>;

    /// Removes a key from `shard_id`'s part of `table`.
    fn delete_from_shard(&mut self, shard_id: ShardId, table: Table, key: &[u8]) -> Result<()>;

    /// Atomically applies every buffered write.
    fn commit(self: Box<Self>) -> Result<()>;

    /// Upcast for read-only helpers.
    fn as_ro(&self) -> &dyn RoTx;
}

/// A transactional storage engine.
pub trait Storage: Send + Sync {
    /// Opens a read-only transaction.
    fn begin_ro(&self) -> Result<Box<dyn RoTx>>;

    /// Opens a read-write transaction.
    fn begin_rw(&self) -> Result<Box<dyn RwTx>>;
}
