//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Messages**: `Message`, `DeployMessage`
//! - **Outcomes**: `Receipt`, `Log`
//! - **Chain**: `Block`, `BlockContext`, `Proposal`

use crate::errors::CodecError;
use crate::value_objects::{Address, BlockNumber, Gas, Hash, ShardId, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// CLUSTER A: MESSAGES
// =============================================================================

/// A unit of work addressed to one account on one shard.
///
/// External messages are signed by a client; internal messages are produced
/// by another shard's execution and arrive pre-funded through `value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Message {
    /// Sender address (its first two bytes name the origin shard).
    pub from: Address,
    /// Destination address (its first two bytes name the target shard).
    pub to: Address,
    /// Value carried by the message.
    pub value: U256,
    /// Per-account sequence number.
    pub seqno: u64,
    /// Maximum gas the message may consume.
    pub gas_limit: Gas,
    /// Price paid per unit of gas.
    pub gas_price: U256,
    /// Call data, or an encoded `DeployMessage` when `deploy` is set.
    pub data: Vec<u8>,
    /// Produced by another shard's execution.
    pub internal: bool,
    /// `data` carries a deployment descriptor.
    pub deploy: bool,
    /// Authorization proof checked by the destination contract.
    pub signature: Vec<u8>,
}

/// The fields that make up a message's identity (everything but the
/// signature).
#[derive(Serialize)]
struct MessageIdentity<'a> {
    from: &'a Address,
    to: &'a Address,
    value: &'a U256,
    seqno: u64,
    gas_limit: Gas,
    gas_price: &'a U256,
    data: &'a [u8],
    internal: bool,
    deploy: bool,
}

impl Message {
    /// Content hash identifying this message.
    #[must_use]
    pub fn hash(&self) -> Hash {
        let identity = MessageIdentity {
            from: &self.from,
            to: &self.to,
            value: &self.value,
            seqno: self.seqno,
            gas_limit: self.gas_limit,
            gas_price: &self.gas_price,
            data: &self.data,
            internal: self.internal,
            deploy: self.deploy,
        };
        // Serializing plain fixed-layout data into a Vec cannot fail.
        let encoded = bincode::serialize(&identity).unwrap_or_default();
        Hash::keccak(&encoded)
    }

    /// Shard the message was produced on.
    #[must_use]
    pub fn origin_shard(&self) -> ShardId {
        self.from.shard_id()
    }

    /// Shard the message is addressed to.
    #[must_use]
    pub fn destination_shard(&self) -> ShardId {
        self.to.shard_id()
    }

    /// Encodes the message for storage or the wire.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        Ok(bincode::serialize(self)?)
    }

    /// Decodes a message produced by [`Message::encode`].
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// Deployment descriptor carried in `Message.data` when `deploy` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployMessage {
    /// Shard the code is deployed to.
    pub shard_id: ShardId,
    /// Contract code.
    pub code: Vec<u8>,
    /// Deployment sequence number.
    pub seqno: u64,
}

impl DeployMessage {
    /// Address the descriptor deploys to.
    #[must_use]
    pub fn address(&self) -> Address {
        Address::create(self.shard_id, &self.code)
    }

    /// Encodes the descriptor as message payload.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        Ok(bincode::serialize(self)?)
    }

    /// Decodes a descriptor from message payload.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

// =============================================================================
// CLUSTER B: OUTCOMES
// =============================================================================

/// An event emitted by a contract during execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    /// Emitting contract.
    pub address: Address,
    /// Indexed topics.
    pub topics: Vec<Hash>,
    /// Unindexed payload.
    pub data: Vec<u8>,
}

/// Immutable record of one message's outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Whether the message executed successfully.
    pub success: bool,
    /// Gas charged for the message.
    pub gas_used: Gas,
    /// Hash of the message this receipt belongs to.
    pub msg_hash: Hash,
    /// Contract the message was executed against (or deployed).
    pub contract_address: Address,
    /// Logs emitted during execution.
    pub logs: Vec<Log>,
}

impl Receipt {
    /// A failure receipt for a message that was rejected before execution.
    #[must_use]
    pub fn failure(msg_hash: Hash, contract_address: Address, gas_used: Gas) -> Self {
        Self {
            success: false,
            gas_used,
            msg_hash,
            contract_address,
            logs: Vec::new(),
        }
    }

    /// Encodes the receipt for storage.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        Ok(bincode::serialize(self)?)
    }

    /// Decodes a receipt produced by [`Receipt::encode`].
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

// =============================================================================
// CLUSTER C: CHAIN
// =============================================================================

/// A committed shard block.
///
/// Messages and receipts are stored in the shard's tries keyed by block
/// number; the block itself carries their digests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Block {
    /// Shard that produced the block.
    pub shard_id: ShardId,
    /// Block number.
    pub id: BlockNumber,
    /// Hash of the previous block (zero for the zerostate block).
    pub prev_block: Hash,
    /// Main shard head this block was produced against.
    pub main_chain_hash: Hash,
    /// Digest of the ordered in-message hashes.
    pub in_messages_root: Hash,
    /// Digest of the ordered out-message hashes.
    pub out_messages_root: Hash,
    /// Digest of the ordered receipts.
    pub receipts_root: Hash,
}

impl Block {
    /// Block hash: Keccak-256 of the encoded block.
    #[must_use]
    pub fn hash(&self) -> Hash {
        let encoded = bincode::serialize(self).unwrap_or_default();
        Hash::keccak(&encoded)
    }

    /// The zerostate block of a shard.
    #[must_use]
    pub fn zerostate(shard_id: ShardId) -> Self {
        Self {
            shard_id,
            ..Self::default()
        }
    }

    /// Encodes the block for storage or the wire.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        Ok(bincode::serialize(self)?)
    }

    /// Decodes a block produced by [`Block::encode`].
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// Digest over an ordered list of hashes.
#[must_use]
pub fn ordered_root<'a>(hashes: impl IntoIterator<Item = &'a Hash>) -> Hash {
    let mut buf = Vec::new();
    for hash in hashes {
        buf.extend_from_slice(hash.as_bytes());
    }
    if buf.is_empty() {
        return Hash::ZERO;
    }
    Hash::keccak(&buf)
}

/// Block being produced, as seen by execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockContext {
    /// Producing shard.
    pub shard_id: ShardId,
    /// Number of the block under construction.
    pub block_number: BlockNumber,
    /// Hash of its parent.
    pub prev_block: Hash,
    /// Main shard head.
    pub main_chain_hash: Hash,
}

/// Assembled input to block generation.
///
/// Built fresh by the collator from the pool and neighbour shards, or
/// reconstructed by replay from stored tries. Consumed once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Proposal {
    /// Number of the block the new one builds on.
    pub prev_block_id: BlockNumber,
    /// Hash of that block.
    pub prev_block_hash: Hash,
    /// Main shard head.
    pub main_chain_hash: Hash,
    /// Messages executed on this shard, in order.
    pub in_msgs: Vec<Message>,
    /// Messages forwarded to other shards, in order.
    pub out_msgs: Vec<Message>,
    /// Last neighbour block consumed, per neighbour shard.
    pub neighbour_cursors: BTreeMap<ShardId, BlockNumber>,
}

impl Proposal {
    /// Number of the block this proposal produces.
    #[must_use]
    pub fn block_number(&self) -> BlockNumber {
        self.prev_block_id + 1
    }
}
