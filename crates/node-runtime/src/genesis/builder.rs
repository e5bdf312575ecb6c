//! # Genesis Builder

use sc_02_storage::{accessors, Storage, StorageError};
use sc_03_execution::{write_account, AccountState, StateError};
use shared_types::{Address, Block, Hash, MAIN_SHARD_ID};
use thiserror::Error;
use tracing::info;

/// Genesis creation errors.
#[derive(Debug, Error)]
pub enum GenesisError {
    /// The main shard already has a head block.
    #[error("genesis already written")]
    AlreadyExists,

    /// An account lives on a shard that does not exist.
    #[error("account {address} lives on shard {}, but only {n_shards} shards exist", address.shard_id())]
    AccountOutOfRange {
        /// Account.
        address: Address,
        /// Configured shard count.
        n_shards: u16,
    },

    /// Storage failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Writing an account failed.
    #[error("state error: {0}")]
    State(#[from] StateError),
}

/// What genesis wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenesisSummary {
    /// Zerostate hash per shard, indexed by shard id.
    pub zerostates: Vec<Hash>,
    /// Number of accounts written.
    pub accounts: usize,
}

/// Builds the zerostate of an `n_shards` network.
#[derive(Debug, Clone)]
pub struct GenesisBuilder {
    n_shards: u16,
    accounts: Vec<(Address, AccountState)>,
}

impl GenesisBuilder {
    /// Genesis for `n_shards` shards without accounts.
    pub fn new(n_shards: u16) -> Self {
        Self {
            n_shards,
            accounts: Vec::new(),
        }
    }

    /// Adds a pre-funded account.
    #[must_use]
    pub fn with_account(mut self, address: Address, account: AccountState) -> Self {
        self.accounts.push((address, account));
        self
    }

    /// Adds several accounts.
    #[must_use]
    pub fn with_accounts(mut self, accounts: impl IntoIterator<Item = (Address, AccountState)>) -> Self {
        self.accounts.extend(accounts);
        self
    }

    /// Writes genesis in one transaction.
    pub fn build(&self, storage: &dyn Storage) -> Result<GenesisSummary, GenesisError> {
        let mut tx = storage.begin_rw()?;
        if accessors::read_last_block_hash(tx.as_ro(), MAIN_SHARD_ID)?.is_some() {
            return Err(GenesisError::AlreadyExists);
        }
        for (address, _) in &self.accounts {
            if address.shard_id() >= self.n_shards {
                return Err(GenesisError::AccountOutOfRange {
                    address: *address,
                    n_shards: self.n_shards,
                });
            }
        }

        let mut zerostates = Vec::with_capacity(usize::from(self.n_shards));
        let main = accessors::write_block(tx.as_mut(), &Block::zerostate(MAIN_SHARD_ID))?;
        accessors::write_last_block_hash(tx.as_mut(), MAIN_SHARD_ID, main)?;
        zerostates.push(main);
        for shard_id in 1..self.n_shards {
            let block = Block {
                main_chain_hash: main,
                ..Block::zerostate(shard_id)
            };
            let hash = accessors::write_block(tx.as_mut(), &block)?;
            accessors::write_last_block_hash(tx.as_mut(), shard_id, hash)?;
            zerostates.push(hash);
        }

        for (address, account) in &self.accounts {
            write_account(tx.as_mut(), address.shard_id(), address, account)?;
        }
        tx.commit()?;

        info!(
            n_shards = self.n_shards,
            accounts = self.accounts.len(),
            main = %main,
            "genesis written"
        );
        Ok(GenesisSummary {
            zerostates,
            accounts: self.accounts.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sc_02_storage::MemoryStorage;
    use sc_03_execution::read_account;
    use shared_types::U256;

    #[test]
    fn test_genesis_writes_every_shard() {
        let storage = MemoryStorage::new();
        let wallet = Address::on_shard(2, [4; 18]);
        let summary = GenesisBuilder::new(3)
            .with_account(wallet, AccountState::with_balance(U256::from(77)))
            .build(&storage)
            .unwrap();

        assert_eq!(summary.zerostates.len(), 3);
        let ro = storage.begin_ro().unwrap();
        for shard_id in 0..3u16 {
            let (hash, block) = accessors::read_last_block(ro.as_ref(), shard_id)
                .unwrap()
                .unwrap();
            assert_eq!(hash, summary.zerostates[usize::from(shard_id)]);
            assert_eq!(block.id, 0);
            assert_eq!(block.prev_block, Hash::ZERO);
        }
        let (_, shard_2) = accessors::read_last_block(ro.as_ref(), 2).unwrap().unwrap();
        assert_eq!(shard_2.main_chain_hash, summary.zerostates[0]);
        let account = read_account(ro.as_ref(), 2, &wallet).unwrap().unwrap();
        assert_eq!(account.balance, U256::from(77));
    }

    #[test]
    fn test_genesis_is_written_once() {
        let storage = MemoryStorage::new();
        GenesisBuilder::new(2).build(&storage).unwrap();
        assert!(matches!(
            GenesisBuilder::new(2).build(&storage),
            Err(GenesisError::AlreadyExists)
        ));
    }

    #[test]
    fn test_account_on_missing_shard_writes_nothing() {
        let storage = MemoryStorage::new();
        let result = GenesisBuilder::new(2)
            .with_account(Address::on_shard(5, [1; 18]), AccountState::default())
            .build(&storage);
        assert!(matches!(result, Err(GenesisError::AccountOutOfRange { n_shards: 2, .. })));
        assert!(storage.is_empty());
    }
}
