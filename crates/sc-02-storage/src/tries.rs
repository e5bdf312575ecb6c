//! # Message Tries
//!
//! Per-block ordered message and receipt sets, keyed by
//! `block_number || index` (both big-endian) so a prefix scan over one block
//! returns its entries in index order.
//!
//! Writing a block's out-messages also indexes them by hash, which is how a
//! destination shard proves an internal message was really emitted.

use crate::errors::{Result, StorageError};
use crate::ports::{RoTx, RwTx, Table};
use shared_types::{BlockNumber, Hash, Message, Receipt, ShardId};

fn entry_key(block: BlockNumber, index: u64) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&block.to_be_bytes());
    key[8..].copy_from_slice(&index.to_be_bytes());
    key
}

fn entry_index(key: &[u8]) -> Result<u64> {
    key.get(8..16)
        .and_then(|bytes| <[u8; 8]>::try_from(bytes).ok())
        .map(u64::from_be_bytes)
        .ok_or(StorageError::Malformed { what: "trie key" })
}

fn read_entries(
    tx: &dyn RoTx,
    shard_id: ShardId,
    table: Table,
    block: BlockNumber,
) -> Result<Vec<(u64, Message)>> {
    tx.scan_shard(shard_id, table, &block.to_be_bytes())?
        .into_iter()
        .map(|(key, value)| Ok((entry_index(&key)?, Message::decode(&value)?)))
        .collect()
}

/// Stores the messages executed by `block`.
pub fn write_in_messages(
    tx: &mut dyn RwTx,
    shard_id: ShardId,
    block: BlockNumber,
    messages: &[Message],
) -> Result<()> {
    for (index, msg) in messages.iter().enumerate() {
        let key = entry_key(block, index as u64);
        tx.put_to_shard(shard_id, Table::InMessages, &key, msg.encode()?)?;
        tx.put_to_shard(
            shard_id,
            Table::InMessageIndex,
            msg.hash().as_bytes(),
            block.to_be_bytes().to_vec(),
        )?;
    }
    Ok(())
}

/// Stores the messages emitted or forwarded by `block`.
pub fn write_out_messages(
    tx: &mut dyn RwTx,
    shard_id: ShardId,
    block: BlockNumber,
    messages: &[Message],
) -> Result<()> {
    for (index, msg) in messages.iter().enumerate() {
        let key = entry_key(block, index as u64);
        let encoded = msg.encode()?;
        tx.put_to_shard(shard_id, Table::OutMessages, &key, encoded.clone())?;
        tx.put_to_shard(
            shard_id,
            Table::OutMessageIndex,
            msg.hash().as_bytes(),
            encoded,
        )?;
    }
    Ok(())
}

/// In-messages of `block` as `(index, message)`, in index order.
pub fn read_in_messages(
    tx: &dyn RoTx,
    shard_id: ShardId,
    block: BlockNumber,
) -> Result<Vec<(u64, Message)>> {
    read_entries(tx, shard_id, Table::InMessages, block)
}

/// Out-messages of `block` as `(index, message)`, in index order.
pub fn read_out_messages(
    tx: &dyn RoTx,
    shard_id: ShardId,
    block: BlockNumber,
) -> Result<Vec<(u64, Message)>> {
    read_entries(tx, shard_id, Table::OutMessages, block)
}

/// An out-message recorded by `shard_id`, looked up by hash.
pub fn find_out_message(tx: &dyn RoTx, shard_id: ShardId, hash: &Hash) -> Result<Option<Message>> {
    tx.get_from_shard(shard_id, Table::OutMessageIndex, hash.as_bytes())?
        .map(|bytes| Message::decode(&bytes).map_err(StorageError::from))
        .transpose()
}

/// Whether `shard_id` has already executed the message with this hash.
pub fn in_message_processed(tx: &dyn RoTx, shard_id: ShardId, hash: &Hash) -> Result<bool> {
    tx.exists_in_shard(shard_id, Table::InMessageIndex, hash.as_bytes())
}

/// Drops the processed-message index entries written for `block`.
///
/// The block's trie entries stay; only the "already executed" marks go, so
/// the messages can be delivered again.
pub fn forget_in_messages(
    tx: &mut dyn RwTx,
    shard_id: ShardId,
    block: BlockNumber,
) -> Result<usize> {
    let mut forgotten = 0;
    for (_, msg) in read_in_messages(tx.as_ro(), shard_id, block)? {
        let hash = msg.hash();
        let indexed_at = tx.get_from_shard(shard_id, Table::InMessageIndex, hash.as_bytes())?;
        if indexed_at.as_deref() == Some(block.to_be_bytes().as_slice()) {
            tx.delete_from_shard(shard_id, Table::InMessageIndex, hash.as_bytes())?;
            forgotten += 1;
        }
    }
    Ok(forgotten)
}

/// Lays trie entries out by index.
///
/// Indices must be exactly `0..len`; a gap or a repeated index means the
/// trie is corrupted.
pub fn dense_by_index<T>(
    shard_id: ShardId,
    block: BlockNumber,
    entries: Vec<(u64, T)>,
) -> Result<Vec<T>> {
    let len = entries.len();
    let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(len).collect();
    for (index, item) in entries {
        let slot = usize::try_from(index)
            .ok()
            .and_then(|i| slots.get_mut(i))
            .ok_or_else(|| StorageError::TrieCorrupted {
                shard_id,
                block,
                reason: format!("index {index} out of range for {len} entries"),
            })?;
        if slot.replace(item).is_some() {
            return Err(StorageError::TrieCorrupted {
                shard_id,
                block,
                reason: format!("duplicate index {index}"),
            });
        }
    }
    slots
        .into_iter()
        .enumerate()
        .map(|(i, slot)| {
            slot.ok_or_else(|| StorageError::TrieCorrupted {
                shard_id,
                block,
                reason: format!("missing index {i}"),
            })
        })
        .collect()
}

/// Stores the receipts of `block`, in processing order.
pub fn write_receipts(
    tx: &mut dyn RwTx,
    shard_id: ShardId,
    block: BlockNumber,
    receipts: &[Receipt],
) -> Result<()> {
    for (index, receipt) in receipts.iter().enumerate() {
        tx.put_to_shard(
            shard_id,
            Table::Receipts,
            &entry_key(block, index as u64),
            receipt.encode()?,
        )?;
    }
    Ok(())
}

/// Receipts of `block`, in processing order.
pub fn read_receipts(tx: &dyn RoTx, shard_id: ShardId, block: BlockNumber) -> Result<Vec<Receipt>> {
    tx.scan_shard(shard_id, Table::Receipts, &block.to_be_bytes())?
        .into_iter()
        .map(|(_, value)| Ok(Receipt::decode(&value)?))
        .collect()
}
