//! # Error Types
//!
//! - [`VmError`]: the engine failed the message; it still gets a receipt.
//! - [`ValidationError`]: the message was rejected before execution.
//! - [`StateError`]: state access failed; fatal for the block attempt.
//! - [`HandlerError`]: what aborts a batch.

use sc_02_storage::StorageError;
use shared_types::{Address, CodecError, Hash, ShardId, U256};
use thiserror::Error;

// =============================================================================
// VM ERRORS
// =============================================================================

/// Errors the execution engine reports for a single message.
///
/// These never abort a batch: the message gets a failure receipt.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VmError {
    /// Execution ran out of gas.
    #[error("out of gas: required {required}, limit {limit}")]
    OutOfGas {
        /// Gas the operation needs
        required: u64,
        /// Gas available
        limit: u64,
    },

    /// A contract already lives at the deployment address.
    #[error("contract already exists at {0}")]
    ContractAlreadyExists(Address),

    /// The account cannot cover a value transfer.
    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        /// Amount required
        required: U256,
        /// Amount available
        available: U256,
    },

    /// Execution reverted.
    #[error("revert: {0}")]
    Revert(String),
}

// =============================================================================
// VALIDATION ERRORS
// =============================================================================

/// Why a message was rejected.
///
/// A rejected message gets a failure receipt and the batch continues.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The destination account does not exist.
    #[error("invalid address {0}")]
    InvalidAddress(Address),

    /// The destination contract did not authorize the message.
    #[error("signature rejected by {0}")]
    SignatureRejected(Address),

    /// A code-less account only accepts messages it sends to itself.
    #[error("self-deploy mismatch: from {from} to {to}")]
    SelfDeployMismatch {
        /// Sender
        from: Address,
        /// Destination
        to: Address,
    },

    /// The message seqno does not match the account's.
    #[error("seqno gap: expected {expected}, got {got}")]
    SeqnoGap {
        /// Account seqno
        expected: u64,
        /// Message seqno
        got: u64,
    },

    /// The message is addressed to another shard.
    #[error("message for shard {got} delivered to shard {expected}")]
    WrongShard {
        /// Executing shard
        expected: ShardId,
        /// Destination shard
        got: ShardId,
    },

    /// An internal message submitted from outside instead of arriving
    /// from another shard's out-messages.
    #[error("internal message {0} was submitted externally")]
    SubmittedInternal(Hash),

    /// The deploy payload is not a deployment descriptor.
    #[error("malformed deploy payload: {0}")]
    Decode(#[from] CodecError),

    /// Only the system wallet deploys onto the main shard.
    #[error("deploy to main shard from {0} is forbidden")]
    MainShardForbidden(Address),

    /// `to` is not the content address of the deployed code.
    #[error("deploy address mismatch: expected {expected}, got {got}")]
    AddressMismatch {
        /// Address derived from shard and code
        expected: Address,
        /// Message destination
        got: Address,
    },
}

// =============================================================================
// STATE ERRORS
// =============================================================================

/// Errors from execution state access.
#[derive(Debug, Error)]
pub enum StateError {
    /// The payer cannot cover a debit.
    #[error("insufficient funds in {payer}: required {required}, available {available}")]
    InsufficientFunds {
        /// Payer description
        payer: String,
        /// Amount required
        required: U256,
        /// Amount available
        available: U256,
    },

    /// A credit would overflow a balance.
    #[error("balance overflow at {0}")]
    BalanceOverflow(Address),

    /// Account state could not be decoded.
    #[error("corrupted account state: {0}")]
    Codec(#[from] CodecError),

    /// The storage transaction failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<bincode::Error> for StateError {
    fn from(err: bincode::Error) -> Self {
        Self::Codec(CodecError::from(err))
    }
}

// =============================================================================
// HANDLER ERRORS
// =============================================================================

/// Errors that abort a message batch.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// An internal message was not emitted by its origin shard.
    #[error("internal message {hash} not found in out-messages of shard {shard_id}")]
    MissingOriginMessage {
        /// Origin shard
        shard_id: ShardId,
        /// Message hash
        hash: Hash,
    },

    /// The engine failed outside of normal VM semantics.
    #[error("engine failure: {0}")]
    EngineFatal(#[source] StateError),

    /// State access failed.
    #[error(transparent)]
    State(#[from] StateError),
}
