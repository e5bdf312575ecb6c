//! # Storage-Backed Execution State
//!
//! Accounts are loaded lazily from the block's read-write transaction into
//! a cache and written back by [`StorageState::finish`]. Dropping the state
//! without finishing drops the transaction, which discards every write.
//!
//! Finishing also journals the pre-block value of every changed account
//! under the block number, so [`revert_account_changes`] can restore the
//! state a block was executed against.

use crate::adapters::engine::ReferenceEngine;
use crate::domain::{AccountState, BalanceChangeReason, ExecutionOutcome};
use crate::errors::StateError;
use crate::ports::ExecutionState;
use sc_02_storage::{RoTx, RwTx, StorageError, Table};
use shared_types::{
    verify_authorization, Address, BlockContext, BlockNumber, DeployMessage, Hash, Message,
    Receipt, ShardId, U256,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;

/// Reads an account of `shard_id`.
pub fn read_account(
    tx: &dyn RoTx,
    shard_id: ShardId,
    address: &Address,
) -> Result<Option<AccountState>, StateError> {
    tx.get_from_shard(shard_id, Table::Accounts, address.as_bytes())?
        .map(|bytes| bincode::deserialize(&bytes).map_err(StateError::from))
        .transpose()
}

/// Writes an account of `shard_id`.
pub fn write_account(
    tx: &mut dyn RwTx,
    shard_id: ShardId,
    address: &Address,
    account: &AccountState,
) -> Result<(), StateError> {
    let encoded = bincode::serialize(account)?;
    tx.put_to_shard(shard_id, Table::Accounts, address.as_bytes(), encoded)?;
    Ok(())
}

fn journal_key(block: BlockNumber, address: &Address) -> Vec<u8> {
    let mut key = block.to_be_bytes().to_vec();
    key.extend_from_slice(address.as_bytes());
    key
}

/// Restores every account `block` changed to its value before the block,
/// and forgets the block's journal.
///
/// Blocks must be reverted newest first.
pub fn revert_account_changes(
    tx: &mut dyn RwTx,
    shard_id: ShardId,
    block: BlockNumber,
) -> Result<usize, StateError> {
    let entries = tx.scan_shard(shard_id, Table::AccountJournal, &block.to_be_bytes())?;
    let reverted = entries.len();
    for (key, value) in entries {
        let address = key
            .get(8..)
            .and_then(Address::from_slice)
            .ok_or(StorageError::Malformed {
                what: "account journal key",
            })?;
        let previous: Option<AccountState> = bincode::deserialize(&value)?;
        match previous {
            Some(account) => write_account(tx, shard_id, &address, &account)?,
            None => tx.delete_from_shard(shard_id, Table::Accounts, address.as_bytes())?,
        }
        tx.delete_from_shard(shard_id, Table::AccountJournal, &key)?;
    }
    trace!(shard = shard_id, block, accounts = reverted, "account changes reverted");
    Ok(reverted)
}

/// What a finished block execution hands back to the generator.
pub struct FinishedState {
    /// The transaction, with every account change written.
    pub tx: Box<dyn RwTx>,
    /// Receipts in processing order.
    pub receipts: Vec<Receipt>,
    /// Messages emitted during execution.
    pub out_messages: Vec<Message>,
}

/// [`ExecutionState`] over one read-write storage transaction.
pub struct StorageState {
    shard_id: ShardId,
    tx: Box<dyn RwTx>,
    engine: ReferenceEngine,
    accounts: BTreeMap<Address, Option<AccountState>>,
    originals: BTreeMap<Address, Option<AccountState>>,
    dirty: BTreeSet<Address>,
    in_message_hash: Hash,
    receipts: Vec<Receipt>,
    out_messages: Vec<Message>,
}

impl StorageState {
    /// Binds execution state for `shard_id` to `tx`.
    pub fn new(shard_id: ShardId, tx: Box<dyn RwTx>, engine: ReferenceEngine) -> Self {
        Self {
            shard_id,
            tx,
            engine,
            accounts: BTreeMap::new(),
            originals: BTreeMap::new(),
            dirty: BTreeSet::new(),
            in_message_hash: Hash::ZERO,
            receipts: Vec::new(),
            out_messages: Vec::new(),
        }
    }

    /// Hash of the message being processed.
    pub fn in_message_hash(&self) -> Hash {
        self.in_message_hash
    }

    /// Messages emitted so far.
    pub fn out_messages(&self) -> &[Message] {
        &self.out_messages
    }

    /// Queues a message for delivery to another shard.
    pub fn emit(&mut self, msg: Message) {
        trace!(shard = self.shard_id, to = %msg.to, "out-message emitted");
        self.out_messages.push(msg);
    }

    /// Installs code at `address`, creating the account if needed.
    pub fn install_code(&mut self, address: &Address, code: Vec<u8>) -> Result<(), StateError> {
        let account = self.account_mut(address)?;
        account.code = code;
        Ok(())
    }

    /// Writes every changed account, journals its pre-block value under
    /// `block` and hands the transaction back.
    pub fn finish(mut self, block: BlockNumber) -> Result<FinishedState, StateError> {
        for address in std::mem::take(&mut self.dirty) {
            let Some(Some(account)) = self.accounts.get(&address) else {
                continue;
            };
            let original = self.originals.get(&address).cloned().flatten();
            if original.as_ref() == Some(account) {
                continue;
            }
            self.tx.put_to_shard(
                self.shard_id,
                Table::AccountJournal,
                &journal_key(block, &address),
                bincode::serialize(&original)?,
            )?;
            write_account(self.tx.as_mut(), self.shard_id, &address, account)?;
        }
        Ok(FinishedState {
            tx: self.tx,
            receipts: self.receipts,
            out_messages: self.out_messages,
        })
    }

    fn cached(&mut self, address: &Address) -> Result<&mut Option<AccountState>, StateError> {
        if !self.accounts.contains_key(address) {
            let loaded = read_account(self.tx.as_ro(), self.shard_id, address)?;
            self.originals.insert(*address, loaded.clone());
            self.accounts.insert(*address, loaded);
        }
        Ok(self.accounts.entry(*address).or_default())
    }

    fn account_mut(&mut self, address: &Address) -> Result<&mut AccountState, StateError> {
        self.dirty.insert(*address);
        Ok(self.cached(address)?.get_or_insert_with(AccountState::default))
    }
}

impl ExecutionState for StorageState {
    fn shard_id(&self) -> ShardId {
        self.shard_id
    }

    fn set_in_message_hash(&mut self, hash: Hash) {
        self.in_message_hash = hash;
    }

    fn account(&mut self, address: &Address) -> Result<Option<AccountState>, StateError> {
        Ok(self.cached(address)?.clone())
    }

    fn sub_balance(
        &mut self,
        address: &Address,
        amount: U256,
        reason: BalanceChangeReason,
    ) -> Result<(), StateError> {
        let available = self
            .cached(address)?
            .as_ref()
            .map(|account| account.balance)
            .unwrap_or_default();
        if available < amount {
            return Err(StateError::InsufficientFunds {
                payer: format!("account {address}"),
                required: amount,
                available,
            });
        }
        self.account_mut(address)?.balance = available - amount;
        trace!(%address, %amount, %reason, "balance debited");
        Ok(())
    }

    fn add_balance(
        &mut self,
        address: &Address,
        amount: U256,
        reason: BalanceChangeReason,
    ) -> Result<(), StateError> {
        let account = self.account_mut(address)?;
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or(StateError::BalanceOverflow(*address))?;
        trace!(%address, %amount, %reason, "balance credited");
        Ok(())
    }

    fn set_seqno(&mut self, address: &Address, seqno: u64) -> Result<(), StateError> {
        self.account_mut(address)?.seqno = seqno;
        Ok(())
    }

    fn verify_external(
        &mut self,
        msg: &Message,
        account: &AccountState,
    ) -> Result<bool, StateError> {
        Ok(verify_authorization(&account.code, &msg.hash(), &msg.signature))
    }

    fn add_receipt(&mut self, receipt: Receipt) {
        self.receipts.push(receipt);
    }

    fn receipts(&self) -> &[Receipt] {
        &self.receipts
    }

    fn deploy(
        &mut self,
        msg: &Message,
        deploy: &DeployMessage,
        ctx: &BlockContext,
    ) -> ExecutionOutcome {
        let engine = self.engine;
        engine.deploy(self, msg, deploy, ctx)
    }

    fn execute(&mut self, msg: &Message, ctx: &BlockContext) -> ExecutionOutcome {
        let engine = self.engine;
        engine.execute(self, msg, ctx)
    }
}
