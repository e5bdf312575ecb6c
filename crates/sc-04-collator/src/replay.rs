//! # Replay Scheduler
//!
//! Regenerates a stored block from its recorded inputs and checks that the
//! result hashes the same.
//!
//! Replay is destructive: the shard's head is moved back to block `n-1` and
//! the account changes of blocks `n..=head` are reverted before block `n`
//! is generated again. Blocks after `n` also give back their neighbour
//! cursors and processed-message marks, so collation resuming after the
//! replay delivers their internal messages again. Only one replay runs per
//! process and shard.
//!
//! The regenerated block carries the main chain hash block `n` was stamped
//! with when it was collated.

use crate::config::ReplayConfig;
use crate::errors::{CollationError, ReplayError};
use crate::ports::{BlockGeneratorFactory, GeneratorParams};
use sc_02_storage::{accessors, tries, Storage};
use sc_03_execution::revert_account_changes;
use shared_types::{BlockNumber, Hash, Message, Proposal, ShardId, MAIN_SHARD_ID};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time;
use tracing::{info, info_span, warn, Instrument, Span};

/// Outcome of one replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayReport {
    /// Replayed shard.
    pub shard_id: ShardId,
    /// Replayed block.
    pub block: BlockNumber,
    /// Hash stored for the block before replay.
    pub expected: Hash,
    /// Hash of the regenerated block.
    pub regenerated: Hash,
    /// Whether the two agree.
    pub matches: bool,
}

/// Replays one block of one shard.
pub struct ReplayScheduler {
    config: ReplayConfig,
    storage: Arc<dyn Storage>,
    factory: Arc<dyn BlockGeneratorFactory>,
    span: Span,
}

impl ReplayScheduler {
    /// Creates a replay of `config.block` on `config.shard_id`.
    pub fn new(
        config: ReplayConfig,
        storage: Arc<dyn Storage>,
        factory: Arc<dyn BlockGeneratorFactory>,
    ) -> Self {
        let span = info_span!("replay", shard = config.shard_id, block = config.block);
        Self {
            config,
            storage,
            factory,
            span,
        }
    }

    /// Replays the block, then idles until `shutdown`.
    ///
    /// Shutdown during the replay abandons it; the generator's transaction
    /// is discarded.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), ReplayError> {
        tokio::select! {
            biased;
            _ = shutdown.changed() => {
                self.span.in_scope(|| info!("shutdown during replay"));
                return Ok(());
            }
            report = self.replay() => { report?; }
        }
        while !*shutdown.borrow() {
            if shutdown.changed().await.is_err() {
                break;
            }
        }
        Ok(())
    }

    /// Rewinds the shard and regenerates the block.
    pub async fn replay(&self) -> Result<ReplayReport, ReplayError> {
        self.replay_inner().instrument(self.span.clone()).await
    }

    async fn replay_inner(&self) -> Result<ReplayReport, ReplayError> {
        let shard_id = self.config.shard_id;
        let block = self.config.block;
        if shard_id == MAIN_SHARD_ID {
            return Err(ReplayError::MainShard);
        }
        if block == 0 {
            return Err(ReplayError::ZeroStateBlock(shard_id));
        }

        let (expected, proposal) = self.rewind()?;
        info!(
            in_msgs = proposal.in_msgs.len(),
            out_msgs = proposal.out_msgs.len(),
            "shard rewound, regenerating block"
        );

        let mut generator = self.factory.new_generator(GeneratorParams { shard_id })?;
        let result = time::timeout(
            self.config.attempt_timeout,
            generator.generate_block(&proposal),
        )
        .await;
        generator.rollback();
        let generated = result.map_err(|_| CollationError::Timeout {
            shard_id,
            after: self.config.attempt_timeout,
        })??;

        let matches = generated.hash == expected;
        if matches {
            info!(hash = %expected, "replayed block matches");
        } else {
            warn!(
                expected = %expected,
                regenerated = %generated.hash,
                "replayed block differs from the stored one"
            );
        }
        Ok(ReplayReport {
            shard_id,
            block,
            expected,
            regenerated: generated.hash,
            matches,
        })
    }

    /// Moves the head back to block `n-1` and collects block `n`'s inputs.
    fn rewind(&self) -> Result<(Hash, Proposal), ReplayError> {
        let shard_id = self.config.shard_id;
        let n = self.config.block;
        let not_found = |block| ReplayError::BlockNotFound { shard_id, block };

        let mut tx = self.storage.begin_rw()?;
        let ro = tx.as_ro();
        let expected =
            accessors::read_block_hash_by_number(ro, shard_id, n)?.ok_or_else(|| not_found(n))?;
        let prev_hash = accessors::read_block_hash_by_number(ro, shard_id, n - 1)?
            .ok_or_else(|| not_found(n - 1))?;
        let prev = accessors::read_block(ro, shard_id, &prev_hash)?
            .ok_or_else(|| not_found(n - 1))?;
        let stored =
            accessors::read_block(ro, shard_id, &expected)?.ok_or_else(|| not_found(n))?;
        let (_, head) =
            accessors::read_last_block(ro, shard_id)?.ok_or_else(|| not_found(n))?;

        let in_msgs = tries::dense_by_index(shard_id, n, tries::read_in_messages(ro, shard_id, n)?)?;
        let mut out = tries::read_out_messages(ro, shard_id, n)?;
        out.sort_by_key(|(index, _)| *index);
        let out_msgs: Vec<Message> = out
            .into_iter()
            .map(|(_, msg)| msg)
            .filter(|msg| msg.origin_shard() != shard_id)
            .collect();

        for number in (n..=head.id).rev() {
            revert_account_changes(tx.as_mut(), shard_id, number)?;
            if number > n {
                accessors::revert_neighbour_cursors(tx.as_mut(), shard_id, number)?;
                tries::forget_in_messages(tx.as_mut(), shard_id, number)?;
            }
        }
        accessors::write_last_block_hash(tx.as_mut(), shard_id, prev_hash)?;
        tx.commit()?;

        Ok((
            expected,
            Proposal {
                prev_block_id: prev.id,
                prev_block_hash: prev_hash,
                main_chain_hash: stored.main_chain_hash,
                in_msgs,
                out_msgs,
                ..Proposal::default()
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryMessagePool, StateBlockGeneratorFactory};
    use crate::collator::Collator;
    use crate::config::CollatorConfig;
    use sc_02_storage::{MemoryStorage, RoTx, RwTx};
    use sc_03_execution::{read_account, write_account, AccountState, ReferenceEngine};
    use shared_types::{Address, Block, Gas, U256};

    struct PanickingStorage;

    impl Storage for PanickingStorage {
        fn begin_ro(&self) -> sc_02_storage::Result<Box<dyn RoTx>> {
            panic!("storage touched")
        }

        fn begin_rw(&self) -> sc_02_storage::Result<Box<dyn RwTx>> {
            panic!("storage touched")
        }
    }

    fn factory(storage: &Arc<dyn Storage>) -> Arc<dyn BlockGeneratorFactory> {
        Arc::new(StateBlockGeneratorFactory::new(
            Arc::clone(storage),
            ReferenceEngine::default(),
        ))
    }

    fn genesis(storage: &MemoryStorage, wallet: Address) {
        let mut tx = storage.begin_rw().unwrap();
        let main = accessors::write_block(tx.as_mut(), &Block::zerostate(MAIN_SHARD_ID)).unwrap();
        accessors::write_last_block_hash(tx.as_mut(), MAIN_SHARD_ID, main).unwrap();
        let zerostate = Block {
            main_chain_hash: main,
            ..Block::zerostate(1)
        };
        let hash = accessors::write_block(tx.as_mut(), &zerostate).unwrap();
        accessors::write_last_block_hash(tx.as_mut(), 1, hash).unwrap();
        write_account(
            tx.as_mut(),
            1,
            &wallet,
            &AccountState::with_balance(U256::from(1_000_000)),
        )
        .unwrap();
        tx.commit().unwrap();
    }

    fn wallet_message(wallet: Address, seqno: u64) -> Message {
        Message {
            from: wallet,
            to: wallet,
            seqno,
            gas_limit: Gas(5_000),
            gas_price: U256::one(),
            ..Message::default()
        }
    }

    #[tokio::test]
    async fn test_zerostate_block_is_refused_without_storage_access() {
        let storage: Arc<dyn Storage> = Arc::new(PanickingStorage);
        let replay = ReplayScheduler::new(ReplayConfig::new(1, 0), Arc::clone(&storage), factory(&storage));

        let err = replay.replay().await.unwrap_err();
        assert!(err.to_string().contains("zerostate-block"));
    }

    #[tokio::test]
    async fn test_main_shard_is_refused() {
        let storage: Arc<dyn Storage> = Arc::new(PanickingStorage);
        let replay = ReplayScheduler::new(
            ReplayConfig::new(MAIN_SHARD_ID, 3),
            Arc::clone(&storage),
            factory(&storage),
        );

        assert!(matches!(replay.replay().await, Err(ReplayError::MainShard)));
    }

    #[tokio::test]
    async fn test_unknown_block_leaves_head_alone() {
        let memory = MemoryStorage::new();
        let wallet = Address::on_shard(1, [1; 18]);
        genesis(&memory, wallet);
        let storage: Arc<dyn Storage> = Arc::new(memory.clone());
        let head_before = {
            let ro = memory.begin_ro().unwrap();
            accessors::read_last_block_hash(ro.as_ref(), 1).unwrap()
        };

        let replay = ReplayScheduler::new(ReplayConfig::new(1, 5), Arc::clone(&storage), factory(&storage));
        assert!(matches!(
            replay.replay().await,
            Err(ReplayError::BlockNotFound { shard_id: 1, block: 5 })
        ));
        let ro = memory.begin_ro().unwrap();
        assert_eq!(accessors::read_last_block_hash(ro.as_ref(), 1).unwrap(), head_before);
    }

    #[tokio::test]
    async fn test_replay_regenerates_identical_block() {
        let memory = MemoryStorage::new();
        let wallet = Address::on_shard(1, [1; 18]);
        genesis(&memory, wallet);
        let storage: Arc<dyn Storage> = Arc::new(memory.clone());
        let pool = Arc::new(InMemoryMessagePool::default());
        let collator = Collator::new(
            CollatorConfig::new(1, 2),
            Arc::clone(&storage),
            Arc::clone(&pool) as Arc<dyn crate::ports::MessagePool>,
            factory(&storage),
        );

        pool.add(wallet_message(wallet, 0)).unwrap();
        pool.add(wallet_message(wallet, 1)).unwrap();
        let first = collator.collate().await.unwrap().unwrap();
        pool.add(wallet_message(wallet, 2)).unwrap();
        let second = collator.collate().await.unwrap().unwrap();
        assert_eq!(second.block.id, 2);

        let replay = ReplayScheduler::new(ReplayConfig::new(1, 1), Arc::clone(&storage), factory(&storage));
        let report = replay.replay().await.unwrap();

        assert!(report.matches);
        assert_eq!(report.expected, first.hash);
        assert_eq!(report.regenerated, first.hash);
        let ro = memory.begin_ro().unwrap();
        assert_eq!(
            accessors::read_last_block_hash(ro.as_ref(), 1).unwrap(),
            Some(first.hash)
        );
        let account = read_account(ro.as_ref(), 1, &wallet).unwrap().unwrap();
        assert_eq!(account.seqno, 2);
    }

    #[tokio::test]
    async fn test_replay_uses_main_chain_hash_of_stored_block() {
        let memory = MemoryStorage::new();
        let wallet = Address::on_shard(1, [1; 18]);
        genesis(&memory, wallet);
        let storage: Arc<dyn Storage> = Arc::new(memory.clone());
        let pool = Arc::new(InMemoryMessagePool::default());
        let collator = Collator::new(
            CollatorConfig::new(1, 2),
            Arc::clone(&storage),
            Arc::clone(&pool) as Arc<dyn crate::ports::MessagePool>,
            factory(&storage),
        );

        pool.add(wallet_message(wallet, 0)).unwrap();
        let first = collator.collate().await.unwrap().unwrap();
        let main_head = {
            let mut tx = memory.begin_rw().unwrap();
            let main = Block {
                id: 1,
                prev_block: first.block.main_chain_hash,
                ..Block::zerostate(MAIN_SHARD_ID)
            };
            let hash = accessors::write_block(tx.as_mut(), &main).unwrap();
            accessors::write_last_block_hash(tx.as_mut(), MAIN_SHARD_ID, hash).unwrap();
            tx.commit().unwrap();
            hash
        };
        pool.add(wallet_message(wallet, 1)).unwrap();
        let second = collator.collate().await.unwrap().unwrap();
        assert_eq!(second.block.main_chain_hash, main_head);

        let replay = ReplayScheduler::new(ReplayConfig::new(1, 2), Arc::clone(&storage), factory(&storage));
        let report = replay.replay().await.unwrap();

        assert!(report.matches);
        assert_eq!(report.regenerated, second.hash);
    }

    #[tokio::test]
    async fn test_run_waits_for_shutdown() {
        let memory = MemoryStorage::new();
        let wallet = Address::on_shard(1, [1; 18]);
        genesis(&memory, wallet);
        let storage: Arc<dyn Storage> = Arc::new(memory.clone());
        let pool = Arc::new(InMemoryMessagePool::default());
        pool.add(wallet_message(wallet, 0)).unwrap();
        Collator::new(
            CollatorConfig::new(1, 2),
            Arc::clone(&storage),
            pool,
            factory(&storage),
        )
        .collate()
        .await
        .unwrap();

        let replay = Arc::new(ReplayScheduler::new(
            ReplayConfig::new(1, 1),
            Arc::clone(&storage),
            factory(&storage),
        ));
        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn({
            let replay = Arc::clone(&replay);
            async move { replay.run(rx).await }
        });
        tokio::task::yield_now().await;
        assert!(!task.is_finished());

        tx.send(true).unwrap();
        task.await.unwrap().unwrap();
    }
}
