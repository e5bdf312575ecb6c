//! # Chain Accessors
//!
//! Typed reads and writes of the per-shard chain index: blocks by hash,
//! block hashes by number, the head pointer and neighbour cursors.

use crate::errors::{Result, StorageError};
use crate::ports::{RoTx, RwTx, Table};
use shared_types::{Block, BlockNumber, Hash, ShardId};

const LAST_BLOCK_KEY: &[u8] = b"last";

fn decode_hash(bytes: &[u8], what: &'static str) -> Result<Hash> {
    Hash::from_slice(bytes).ok_or(StorageError::Malformed { what })
}

/// Hash of the shard's current head, if the shard has one.
pub fn read_last_block_hash(tx: &dyn RoTx, shard_id: ShardId) -> Result<Option<Hash>> {
    tx.get_from_shard(shard_id, Table::LastBlock, LAST_BLOCK_KEY)?
        .map(|bytes| decode_hash(&bytes, "last block hash"))
        .transpose()
}

/// Moves the shard's head pointer.
pub fn write_last_block_hash(tx: &mut dyn RwTx, shard_id: ShardId, hash: Hash) -> Result<()> {
    tx.put_to_shard(
        shard_id,
        Table::LastBlock,
        LAST_BLOCK_KEY,
        hash.as_bytes().to_vec(),
    )
}

/// Hash of block `number` on the shard's chain.
pub fn read_block_hash_by_number(
    tx: &dyn RoTx,
    shard_id: ShardId,
    number: BlockNumber,
) -> Result<Option<Hash>> {
    tx.get_from_shard(shard_id, Table::BlockHashByNumber, &number.to_be_bytes())?
        .map(|bytes| decode_hash(&bytes, "block hash"))
        .transpose()
}

/// Reads a block by hash.
pub fn read_block(tx: &dyn RoTx, shard_id: ShardId, hash: &Hash) -> Result<Option<Block>> {
    tx.get_from_shard(shard_id, Table::Blocks, hash.as_bytes())?
        .map(|bytes| Block::decode(&bytes).map_err(StorageError::from))
        .transpose()
}

/// Stores a block and indexes it by number. The head pointer is not moved.
pub fn write_block(tx: &mut dyn RwTx, block: &Block) -> Result<Hash> {
    let hash = block.hash();
    tx.put_to_shard(
        block.shard_id,
        Table::Blocks,
        hash.as_bytes(),
        block.encode()?,
    )?;
    tx.put_to_shard(
        block.shard_id,
        Table::BlockHashByNumber,
        &block.id.to_be_bytes(),
        hash.as_bytes().to_vec(),
    )?;
    Ok(hash)
}

/// The shard's head block with its hash.
///
/// A head pointer naming a block that is not stored is
/// [`StorageError::MissingBlock`].
pub fn read_last_block(tx: &dyn RoTx, shard_id: ShardId) -> Result<Option<(Hash, Block)>> {
    let Some(hash) = read_last_block_hash(tx, shard_id)? else {
        return Ok(None);
    };
    let block =
        read_block(tx, shard_id, &hash)?.ok_or(StorageError::MissingBlock { shard_id, hash })?;
    Ok(Some((hash, block)))
}

/// Last block of `neighbour` that `shard_id` has consumed.
pub fn read_neighbour_cursor(
    tx: &dyn RoTx,
    shard_id: ShardId,
    neighbour: ShardId,
) -> Result<Option<BlockNumber>> {
    tx.get_from_shard(shard_id, Table::NeighbourCursors, &neighbour.to_be_bytes())?
        .map(|bytes| decode_cursor(&bytes))
        .transpose()
}

/// Records the last block of `neighbour` that `shard_id` has consumed.
pub fn write_neighbour_cursor(
    tx: &mut dyn RwTx,
    shard_id: ShardId,
    neighbour: ShardId,
    block: BlockNumber,
) -> Result<()> {
    tx.put_to_shard(
        shard_id,
        Table::NeighbourCursors,
        &neighbour.to_be_bytes(),
        block.to_be_bytes().to_vec(),
    )
}

fn decode_cursor(bytes: &[u8]) -> Result<BlockNumber> {
    <[u8; 8]>::try_from(bytes)
        .map(BlockNumber::from_be_bytes)
        .map_err(|_| StorageError::Malformed {
            what: "neighbour cursor",
        })
}

fn cursor_journal_key(block: BlockNumber, neighbour: ShardId) -> Vec<u8> {
    let mut key = block.to_be_bytes().to_vec();
    key.extend_from_slice(&neighbour.to_be_bytes());
    key
}

/// Moves `shard_id`'s cursor for `neighbour` as part of `block`,
/// journaling the previous position so the block can be reverted.
pub fn advance_neighbour_cursor(
    tx: &mut dyn RwTx,
    shard_id: ShardId,
    block: BlockNumber,
    neighbour: ShardId,
    cursor: BlockNumber,
) -> Result<()> {
    let previous = read_neighbour_cursor(tx.as_ro(), shard_id, neighbour)?;
    let journaled = previous.map(|c| c.to_be_bytes().to_vec()).unwrap_or_default();
    tx.put_to_shard(
        shard_id,
        Table::CursorJournal,
        &cursor_journal_key(block, neighbour),
        journaled,
    )?;
    write_neighbour_cursor(tx, shard_id, neighbour, cursor)
}

/// Puts back every cursor `block` advanced and forgets the block's journal.
///
/// Blocks must be reverted newest first.
pub fn revert_neighbour_cursors(
    tx: &mut dyn RwTx,
    shard_id: ShardId,
    block: BlockNumber,
) -> Result<usize> {
    let entries = tx.scan_shard(shard_id, Table::CursorJournal, &block.to_be_bytes())?;
    let reverted = entries.len();
    for (key, previous) in entries {
        let neighbour = key
            .get(8..10)
            .and_then(|bytes| <[u8; 2]>::try_from(bytes).ok())
            .map(ShardId::from_be_bytes)
            .ok_or(StorageError::Malformed {
                what: "cursor journal key",
            })?;
        if previous.is_empty() {
            tx.delete_from_shard(shard_id, Table::NeighbourCursors, &neighbour.to_be_bytes())?;
        } else {
            write_neighbour_cursor(tx, shard_id, neighbour, decode_cursor(&previous)?)?;
        }
        tx.delete_from_shard(shard_id, Table::CursorJournal, &key)?;
    }
    Ok(reverted)
}
