//! # Driven Ports (SPI - Outbound)
//!
//! The message handler depends on two interfaces:
//! - [`ExecutionState`]: per-block mutable state bound to one read-write
//!   storage transaction, plus the execution engine entry points.
//! - [`OutMessageLookup`]: committed out-messages of other shards, used to
//!   prove an internal message was really emitted.

use crate::domain::{AccountState, BalanceChangeReason, ExecutionOutcome};
use crate::errors::StateError;
use shared_types::{Address, BlockContext, DeployMessage, Hash, Message, Receipt, ShardId, U256};

/// Mutable account, code and receipt state of the block under construction.
pub trait ExecutionState: Send {
    /// Shard the state belongs to.
    fn shard_id(&self) -> ShardId;

    /// Marks the message currently being processed.
    fn set_in_message_hash(&mut self, hash: Hash);

    /// Reads an account. `None` if it was never created.
    fn account(&mut self, address: &Address) -> Result<Option<AccountState>, StateError>;

    /// Debits an account.
    ///
    /// Fails with [`StateError::InsufficientFunds`] if the balance is lower
    /// than `amount`.
    fn sub_balance(
        &mut self,
        address: &Address,
        amount: U256,
        reason: BalanceChangeReason,
    ) -> Result<(), StateError>;

    /// Credits an account, creating it if needed.
    fn add_balance(
        &mut self,
        address: &Address,
        amount: U256,
        reason: BalanceChangeReason,
    ) -> Result<(), StateError>;

    /// Sets an account's seqno.
    fn set_seqno(&mut self, address: &Address, seqno: u64) -> Result<(), StateError>;

    /// Asks the contract at `account` whether it authorizes `msg`.
    fn verify_external(&mut self, msg: &Message, account: &AccountState)
        -> Result<bool, StateError>;

    /// Appends a receipt.
    fn add_receipt(&mut self, receipt: Receipt);

    /// Receipts appended so far, in processing order.
    fn receipts(&self) -> &[Receipt];

    /// Engine entry point for validated deployments.
    fn deploy(
        &mut self,
        msg: &Message,
        deploy: &DeployMessage,
        ctx: &BlockContext,
    ) -> ExecutionOutcome;

    /// Engine entry point for plain execution.
    fn execute(&mut self, msg: &Message, ctx: &BlockContext) -> ExecutionOutcome;
}

/// Read access to the out-messages other shards have committed.
pub trait OutMessageLookup: Send + Sync {
    /// Out-message `hash` recorded by `shard_id`.
    fn find_out_message(&self, shard_id: ShardId, hash: &Hash)
        -> Result<Option<Message>, StateError>;
}
