//! Multi-shard harness: one storage, one pool and one collator per shard,
//! collated explicitly instead of on a timer.

use node_runtime::GenesisBuilder;
use sc_01_topology::ShardTopology;
use sc_02_storage::{accessors, tries, MemoryStorage, Storage};
use sc_03_execution::{read_account, AccountState, ReferenceEngine};
use sc_04_collator::{
    BlockGeneratorFactory, Collator, CollatorConfig, GeneratedBlock, InMemoryMessagePool,
    ReplayConfig, ReplayReport, ReplayScheduler, StateBlockGeneratorFactory,
};
use shared_types::{Address, Block, Gas, Hash, Message, Receipt, ShardId, U256};
use std::sync::Arc;

pub const GAS_LIMIT: Gas = Gas(5_000);

pub struct TestNet {
    pub storage: MemoryStorage,
    pub topology: ShardTopology,
    pub n_shards: u16,
    pools: Vec<Arc<InMemoryMessagePool>>,
    collators: Vec<Collator>,
    factory: Arc<dyn BlockGeneratorFactory>,
}

impl TestNet {
    pub fn new(n_shards: u16, topology: ShardTopology, accounts: &[(Address, u64)]) -> Self {
        let storage = MemoryStorage::new();
        GenesisBuilder::new(n_shards)
            .with_accounts(
                accounts
                    .iter()
                    .map(|(address, balance)| (*address, AccountState::with_balance(U256::from(*balance)))),
            )
            .build(&storage)
            .unwrap();

        let shared: Arc<dyn Storage> = Arc::new(storage.clone());
        let factory: Arc<dyn BlockGeneratorFactory> = Arc::new(StateBlockGeneratorFactory::new(
            Arc::clone(&shared),
            ReferenceEngine::default(),
        ));
        let pools: Vec<_> = (0..n_shards)
            .map(|_| Arc::new(InMemoryMessagePool::default()))
            .collect();
        let collators = (0..n_shards)
            .map(|shard_id| {
                let config = CollatorConfig {
                    topology,
                    ..CollatorConfig::new(shard_id, n_shards)
                };
                Collator::new(
                    config,
                    Arc::clone(&shared),
                    pools[usize::from(shard_id)].clone(),
                    Arc::clone(&factory),
                )
            })
            .collect();

        Self {
            storage,
            topology,
            n_shards,
            pools,
            collators,
            factory,
        }
    }

    /// Queues `msg` on its destination shard.
    pub fn submit(&self, msg: Message) -> Hash {
        self.pools[usize::from(msg.destination_shard())]
            .add(msg)
            .unwrap()
    }

    pub fn pool(&self, shard_id: ShardId) -> &InMemoryMessagePool {
        &self.pools[usize::from(shard_id)]
    }

    pub async fn collate(&self, shard_id: ShardId) -> Option<GeneratedBlock> {
        self.collators[usize::from(shard_id)].collate().await.unwrap()
    }

    /// Collates every shard once in id order; returns the blocks produced.
    pub async fn round(&self) -> Vec<GeneratedBlock> {
        let mut blocks = Vec::new();
        for shard_id in 0..self.n_shards {
            if let Some(block) = self.collate(shard_id).await {
                blocks.push(block);
            }
        }
        blocks
    }

    pub async fn replay(&self, shard_id: ShardId, block: u64) -> ReplayReport {
        let storage: Arc<dyn Storage> = Arc::new(self.storage.clone());
        ReplayScheduler::new(
            ReplayConfig::new(shard_id, block),
            storage,
            Arc::clone(&self.factory),
        )
        .replay()
        .await
        .unwrap()
    }

    pub fn account(&self, address: &Address) -> Option<AccountState> {
        let ro = self.storage.begin_ro().unwrap();
        read_account(ro.as_ref(), address.shard_id(), address).unwrap()
    }

    pub fn balance(&self, address: &Address) -> U256 {
        self.account(address)
            .map(|account| account.balance)
            .unwrap_or_default()
    }

    pub fn head(&self, shard_id: ShardId) -> (Hash, Block) {
        let ro = self.storage.begin_ro().unwrap();
        accessors::read_last_block(ro.as_ref(), shard_id)
            .unwrap()
            .unwrap()
    }

    pub fn receipts(&self, shard_id: ShardId, block: u64) -> Vec<Receipt> {
        let ro = self.storage.begin_ro().unwrap();
        tries::read_receipts(ro.as_ref(), shard_id, block).unwrap()
    }

    pub fn out_messages(&self, shard_id: ShardId, block: u64) -> Vec<Message> {
        let ro = self.storage.begin_ro().unwrap();
        tries::read_out_messages(ro.as_ref(), shard_id, block)
            .unwrap()
            .into_iter()
            .map(|(_, msg)| msg)
            .collect()
    }
}

pub fn wallet(shard_id: ShardId, seed: u8) -> Address {
    Address::on_shard(shard_id, [seed; 18])
}

/// An external message from a code-less wallet to itself.
pub fn self_call(wallet: Address, seqno: u64) -> Message {
    Message {
        from: wallet,
        to: wallet,
        seqno,
        gas_limit: GAS_LIMIT,
        gas_price: U256::one(),
        ..Message::default()
    }
}

/// A self call whose execution emits `inner` from the wallet.
pub fn send_via(wallet: Address, seqno: u64, inner: Message) -> Message {
    Message {
        data: inner.encode().unwrap(),
        ..self_call(wallet, seqno)
    }
}

/// An emitted value transfer to `to` that pays for its own execution.
pub fn transfer(to: Address, value: u64) -> Message {
    Message {
        to,
        value: U256::from(value),
        gas_limit: Gas(1_000),
        gas_price: U256::one(),
        ..Message::default()
    }
}
