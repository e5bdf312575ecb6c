//! # Shard Node
//!
//! Wires the shard components over shared in-memory storage:
//!
//! ```text
//!            ┌──────────── per shard ─────────────┐
//!   pool ──▶ │ Scheduler ─▶ Collator ─▶ Generator │ ──▶ storage
//!            │                 │                  │
//!            │                 └─▶ BlockPublisher │ ──▶ network ──▶ BlockListener
//!            └────────────────────────────────────┘
//! ```
//!
//! The configured replay shard runs a [`ReplayScheduler`] instead of a
//! collation scheduler.

use crate::config::NodeConfig;
use crate::errors::NodeError;
use crate::genesis::{GenesisBuilder, GenesisSummary};
use crate::runner::Runner;
use sc_02_storage::{MemoryStorage, Storage};
use sc_03_execution::ReferenceEngine;
use sc_04_collator::{
    BlockGeneratorFactory, Collator, InMemoryMessagePool, ReplayScheduler, Scheduler,
    StateBlockGeneratorFactory,
};
use sc_05_block_propagation::{BlockListener, BlockPublisher};
use shared_bus::{InMemoryNetwork, NetworkManager};
use shared_types::ShardId;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// All shards of one node.
pub struct ShardNode {
    config: NodeConfig,
    storage: MemoryStorage,
    network: Option<Arc<InMemoryNetwork>>,
    pools: Vec<Arc<InMemoryMessagePool>>,
    genesis: GenesisSummary,
}

impl ShardNode {
    /// Validates `config` and writes genesis into fresh storage.
    pub fn new(config: NodeConfig) -> Result<Self, NodeError> {
        config.validate()?;
        let storage = MemoryStorage::new();
        let genesis = GenesisBuilder::new(config.n_shards)
            .with_accounts(config.genesis_accounts()?)
            .build(&storage)?;
        let network = config
            .network
            .enabled
            .then(|| Arc::new(InMemoryNetwork::new()));
        let pools = (0..config.n_shards)
            .map(|_| Arc::new(InMemoryMessagePool::default()))
            .collect();

        Ok(Self {
            config,
            storage,
            network,
            pools,
            genesis,
        })
    }

    /// Node configuration.
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Shared storage handle.
    pub fn storage(&self) -> MemoryStorage {
        self.storage.clone()
    }

    /// Genesis written at startup.
    pub fn genesis(&self) -> &GenesisSummary {
        &self.genesis
    }

    /// Message pool of `shard_id`.
    pub fn pool(&self, shard_id: ShardId) -> Option<Arc<InMemoryMessagePool>> {
        self.pools.get(usize::from(shard_id)).cloned()
    }

    /// The block network, when enabled.
    pub fn network(&self) -> Option<Arc<InMemoryNetwork>> {
        self.network.clone()
    }

    /// Spawns every shard task on `runner`.
    pub fn spawn(&self, runner: &mut Runner) -> Result<(), NodeError> {
        let storage: Arc<dyn Storage> = Arc::new(self.storage.clone());
        let network = self
            .network
            .clone()
            .map(|network| network as Arc<dyn NetworkManager>);
        let factory: Arc<dyn BlockGeneratorFactory> = Arc::new(
            StateBlockGeneratorFactory::new(
                Arc::clone(&storage),
                ReferenceEngine::new(self.config.gas_schedule()),
            )
            .with_system_wallet(self.config.system_wallet()?),
        );
        let replay = self.config.replay_config()?;

        for shard_id in 0..self.config.n_shards {
            if let Some(network) = &network {
                let listener = BlockListener::new(shard_id, Arc::clone(network));
                runner.spawn(format!("listener-{shard_id}"), move |shutdown| async move {
                    listener.run(shutdown).await.map_err(NodeError::from)
                });
            }

            if let Some(replay) = replay.as_ref().filter(|r| r.shard_id == shard_id) {
                let scheduler =
                    ReplayScheduler::new(replay.clone(), Arc::clone(&storage), Arc::clone(&factory));
                runner.spawn(format!("replay-{shard_id}"), move |shutdown| async move {
                    scheduler.run(shutdown).await.map_err(NodeError::from)
                });
                continue;
            }

            let pool = self.pools[usize::from(shard_id)].clone();
            let collator = Collator::new(
                self.config.collator_config(shard_id)?,
                Arc::clone(&storage),
                pool,
                Arc::clone(&factory),
            )
            .with_publisher(Arc::new(BlockPublisher::new(shard_id, network.clone())));
            let scheduler = Scheduler::new(collator);
            runner.spawn(format!("collator-{shard_id}"), move |shutdown| async move {
                scheduler.run(shutdown).await.map_err(NodeError::from)
            });
        }

        info!(
            n_shards = self.config.n_shards,
            topology = %self.config.topology,
            replay = ?replay.as_ref().map(|r| (r.shard_id, r.block)),
            network = network.is_some(),
            "shard tasks spawned"
        );
        Ok(())
    }

    /// Runs every shard until `shutdown` or the first task failure.
    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> Result<(), NodeError> {
        let mut runner = Runner::new();
        self.spawn(&mut runner)?;
        runner.run(shutdown).await
    }
}
