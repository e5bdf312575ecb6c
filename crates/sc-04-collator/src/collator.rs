//! # Collator
//!
//! One collation attempt for one shard:
//!
//! 1. Peek a batch from the pool and screen out messages that can never be
//!    included (wrong shard, internal messages that did not come from a
//!    shard, invalid deploy descriptor).
//! 2. Read the shard head and the main shard head.
//! 3. Scan the out-messages of neighbour shards (and of the shard itself)
//!    committed since the last attempt: messages addressed here become
//!    internal in-messages, messages travelling onward are forwarded.
//! 4. Hand the proposal to a fresh generator, which commits the block or
//!    rolls back.
//! 5. Report the outcome to the pool and publish the block.
//!
//! An attempt with nothing to execute or forward produces no block.

use crate::config::CollatorConfig;
use crate::errors::{CollationError, Result};
use crate::ports::{BlockGeneratorFactory, GeneratedBlock, GeneratorParams, MessagePool};
use sc_02_storage::{accessors, tries, RoTx, Storage};
use sc_03_execution::{validate_deploy_message, ValidationError};
use sc_05_block_propagation::BlockPublisher;
use shared_types::{Hash, Message, Proposal, ShardId, MAIN_SHARD_ID};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, info_span, trace, warn, Instrument, Span};

/// Builds blocks for one shard.
pub struct Collator {
    config: CollatorConfig,
    storage: Arc<dyn Storage>,
    pool: Arc<dyn MessagePool>,
    factory: Arc<dyn BlockGeneratorFactory>,
    publisher: Option<Arc<BlockPublisher>>,
    span: Span,
}

impl Collator {
    /// Creates a collator for `config.shard_id`.
    pub fn new(
        config: CollatorConfig,
        storage: Arc<dyn Storage>,
        pool: Arc<dyn MessagePool>,
        factory: Arc<dyn BlockGeneratorFactory>,
    ) -> Self {
        let span = info_span!("collator", shard = config.shard_id);
        Self {
            config,
            storage,
            pool,
            factory,
            publisher: None,
            span,
        }
    }

    /// Publishes every produced block through `publisher`.
    #[must_use]
    pub fn with_publisher(mut self, publisher: Arc<BlockPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Shard being collated.
    pub fn shard_id(&self) -> ShardId {
        self.config.shard_id
    }

    /// The collator's configuration.
    pub fn config(&self) -> &CollatorConfig {
        &self.config
    }

    /// Runs one collation attempt.
    ///
    /// Returns `None` when there was nothing to put into a block.
    pub async fn collate(&self) -> Result<Option<GeneratedBlock>> {
        self.collate_inner().instrument(self.span.clone()).await
    }

    async fn collate_inner(&self) -> Result<Option<GeneratedBlock>> {
        let batch = self.pool.peek(self.config.max_batch, 0).await?;
        let (admitted, rejected) = self.screen(batch);
        if !rejected.is_empty() {
            self.pool.reject(&rejected).await?;
        }

        let mut proposal = self.build_proposal()?;
        let delivered = proposal.in_msgs.len();
        proposal.in_msgs.extend(admitted.iter().cloned());
        if proposal.in_msgs.is_empty() && proposal.out_msgs.is_empty() {
            trace!("nothing to collate");
            return Ok(None);
        }

        let mut generator = self.factory.new_generator(GeneratorParams {
            shard_id: self.config.shard_id,
        })?;
        let result = generator.generate_block(&proposal).await;
        generator.rollback();
        let generated = result?;

        let dropped: HashSet<&Hash> = generated.dropped.iter().collect();
        let committed: Vec<Message> = admitted
            .into_iter()
            .filter(|msg| !dropped.contains(&msg.hash()))
            .collect();
        self.pool
            .on_new_block(&generated.block, &committed, Some(&generated.dropped))
            .await?;

        if let Some(publisher) = &self.publisher {
            if let Err(err) = publisher.publish(&generated.block).await {
                warn!(block = generated.block.id, error = %err, "block publication failed");
            }
        }

        info!(
            block = generated.block.id,
            hash = %generated.hash,
            delivered,
            pooled = committed.len(),
            forwarded = proposal.out_msgs.len(),
            dropped = generated.dropped.len(),
            "block collated"
        );
        Ok(Some(generated))
    }

    /// Splits a pool batch into admissible messages and hashes to evict.
    fn screen(&self, batch: Vec<Message>) -> (Vec<Message>, Vec<Hash>) {
        let shard_id = self.config.shard_id;
        let mut admitted = Vec::with_capacity(batch.len());
        let mut rejected = Vec::new();
        for msg in batch {
            let reason = if msg.destination_shard() != shard_id {
                Some(ValidationError::WrongShard {
                    expected: shard_id,
                    got: msg.destination_shard(),
                })
            } else if msg.internal {
                Some(ValidationError::SubmittedInternal(msg.hash()))
            } else if msg.deploy {
                validate_deploy_message(&msg, &self.config.system_wallet).err()
            } else {
                None
            };
            match reason {
                Some(reason) => {
                    let hash = msg.hash();
                    info!(msg = %hash, %reason, "message rejected before collation");
                    rejected.push(hash);
                }
                None => admitted.push(msg),
            }
        }
        (admitted, rejected)
    }

    fn build_proposal(&self) -> Result<Proposal> {
        let shard_id = self.config.shard_id;
        let tx = self.storage.begin_ro()?;
        let tx = tx.as_ref();

        let (prev_hash, prev) = accessors::read_last_block(tx, shard_id)?
            .ok_or(CollationError::MissingHead(shard_id))?;
        let main_chain_hash = if shard_id == MAIN_SHARD_ID {
            Hash::ZERO
        } else {
            accessors::read_last_block_hash(tx, MAIN_SHARD_ID)?.unwrap_or(Hash::ZERO)
        };

        let mut proposal = Proposal {
            prev_block_id: prev.id,
            prev_block_hash: prev_hash,
            main_chain_hash,
            ..Proposal::default()
        };
        self.scan_neighbours(tx, &mut proposal)?;
        Ok(proposal)
    }

    fn scan_neighbours(&self, tx: &dyn RoTx, proposal: &mut Proposal) -> Result<()> {
        let shard_id = self.config.shard_id;
        let topology = self.config.topology;
        let mut sources = topology.neighbours(shard_id, self.config.n_shards);
        sources.push(shard_id);

        let mut seen = HashSet::new();
        for source in sources {
            let Some((_, head)) = accessors::read_last_block(tx, source)? else {
                continue;
            };
            let cursor = accessors::read_neighbour_cursor(tx, shard_id, source)?.unwrap_or(0);
            if head.id <= cursor {
                continue;
            }
            for number in cursor + 1..=head.id {
                for (_, msg) in tries::read_out_messages(tx, source, number)? {
                    let dest = msg.destination_shard();
                    let hash = msg.hash();
                    if dest == shard_id {
                        if tries::in_message_processed(tx, shard_id, &hash)? || !seen.insert(hash) {
                            continue;
                        }
                        proposal.in_msgs.push(msg);
                    } else if source != shard_id
                        && topology.should_propagate_msg(source, shard_id, dest)
                        && seen.insert(hash)
                    {
                        proposal.out_msgs.push(msg);
                    }
                }
            }
            debug!(source, from = cursor + 1, to = head.id, "neighbour blocks scanned");
            proposal.neighbour_cursors.insert(source, head.id);
        }
        Ok(())
    }
}
