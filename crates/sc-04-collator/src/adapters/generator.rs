//! # Storage-Backed Block Generator
//!
//! One generator per attempt. It owns a read-write transaction from
//! creation until it commits; every other exit path (error, timeout,
//! cancellation) drops the transaction and with it every write.
//!
//! ## What a block commits
//!
//! | Table                        | Content                                 |
//! |------------------------------|-----------------------------------------|
//! | accounts, account journal    | state changes of executed messages       |
//! | in-messages                  | messages that received a receipt         |
//! | out-messages                 | forwarded messages, then emitted ones    |
//! | receipts                     | one per in-message, in order             |
//! | blocks, block-by-number      | the block                                |
//! | last block                   | head pointer moved to the block          |
//! | neighbour cursors            | from the proposal                        |

use crate::errors::{CollationError, Result};
use crate::ports::{BlockGenerator, BlockGeneratorFactory, GeneratedBlock, GeneratorParams};
use async_trait::async_trait;
use sc_02_storage::{accessors, tries, RwTx, Storage};
use sc_03_execution::{MessageHandler, ReferenceEngine, StorageMessageLookup, StorageState};
use shared_types::{
    ordered_root, Address, Block, BlockContext, Hash, Message, Proposal, Receipt, ShardId,
    MAIN_WALLET_ADDRESS,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info_span, trace, Span};

/// Creates [`StateBlockGenerator`]s over shared storage.
pub struct StateBlockGeneratorFactory {
    storage: Arc<dyn Storage>,
    engine: ReferenceEngine,
    system_wallet: Address,
}

impl StateBlockGeneratorFactory {
    /// Generators over `storage` executing with `engine`.
    pub fn new(storage: Arc<dyn Storage>, engine: ReferenceEngine) -> Self {
        Self {
            storage,
            engine,
            system_wallet: MAIN_WALLET_ADDRESS,
        }
    }

    /// Overrides the only sender allowed to deploy onto the main shard.
    #[must_use]
    pub fn with_system_wallet(mut self, system_wallet: Address) -> Self {
        self.system_wallet = system_wallet;
        self
    }
}

impl BlockGeneratorFactory for StateBlockGeneratorFactory {
    fn new_generator(&self, params: GeneratorParams) -> Result<Box<dyn BlockGenerator>> {
        let tx = self.storage.begin_rw()?;
        Ok(Box::new(StateBlockGenerator {
            shard_id: params.shard_id,
            tx: Some(tx),
            lookup: StorageMessageLookup::new(Arc::clone(&self.storage)),
            engine: self.engine,
            handler: MessageHandler::new(params.shard_id).with_system_wallet(self.system_wallet),
            span: info_span!("block_generator", shard = params.shard_id),
        }))
    }
}

/// Executes a proposal against storage and commits the block.
pub struct StateBlockGenerator {
    shard_id: ShardId,
    tx: Option<Box<dyn RwTx>>,
    lookup: StorageMessageLookup,
    engine: ReferenceEngine,
    handler: MessageHandler,
    span: Span,
}

fn receipt_hash(receipt: &Receipt) -> Result<Hash> {
    let encoded = receipt.encode().map_err(sc_02_storage::StorageError::from)?;
    Ok(Hash::keccak(&encoded))
}

impl StateBlockGenerator {
    fn generate(&mut self, proposal: &Proposal) -> Result<GeneratedBlock> {
        let tx = self.tx.take().ok_or(CollationError::GeneratorSpent)?;
        let ctx = BlockContext {
            shard_id: self.shard_id,
            block_number: proposal.block_number(),
            prev_block: proposal.prev_block_hash,
            main_chain_hash: proposal.main_chain_hash,
        };

        let mut state = StorageState::new(self.shard_id, tx, self.engine);
        let summary =
            self.handler
                .handle_messages(&mut state, &self.lookup, &proposal.in_msgs, &ctx)?;
        let finished = state.finish(ctx.block_number)?;
        let mut tx = finished.tx;

        let dropped: HashSet<Hash> = summary.dropped.iter().copied().collect();
        let executed: Vec<Message> = proposal
            .in_msgs
            .iter()
            .filter(|msg| !dropped.contains(&msg.hash()))
            .cloned()
            .collect();
        let mut out_messages = proposal.out_msgs.clone();
        out_messages.extend(finished.out_messages);

        let in_hashes: Vec<Hash> = executed.iter().map(Message::hash).collect();
        let out_hashes: Vec<Hash> = out_messages.iter().map(Message::hash).collect();
        let receipt_hashes = finished
            .receipts
            .iter()
            .map(receipt_hash)
            .collect::<Result<Vec<_>>>()?;

        let block = Block {
            shard_id: self.shard_id,
            id: ctx.block_number,
            prev_block: proposal.prev_block_hash,
            main_chain_hash: proposal.main_chain_hash,
            in_messages_root: ordered_root(&in_hashes),
            out_messages_root: ordered_root(&out_hashes),
            receipts_root: ordered_root(&receipt_hashes),
        };

        let n = block.id;
        tries::write_in_messages(tx.as_mut(), self.shard_id, n, &executed)?;
        tries::write_out_messages(tx.as_mut(), self.shard_id, n, &out_messages)?;
        tries::write_receipts(tx.as_mut(), self.shard_id, n, &finished.receipts)?;
        let hash = accessors::write_block(tx.as_mut(), &block)?;
        accessors::write_last_block_hash(tx.as_mut(), self.shard_id, hash)?;
        for (&neighbour, &cursor) in &proposal.neighbour_cursors {
            accessors::advance_neighbour_cursor(tx.as_mut(), self.shard_id, n, neighbour, cursor)?;
        }
        tx.commit()?;

        debug!(
            block = n,
            %hash,
            in_msgs = in_hashes.len(),
            out_msgs = out_hashes.len(),
            receipts = receipt_hashes.len(),
            "block committed"
        );
        Ok(GeneratedBlock {
            block,
            hash,
            committed: in_hashes,
            dropped: summary.dropped.clone(),
            out_messages,
            summary,
        })
    }
}

#[async_trait]
impl BlockGenerator for StateBlockGenerator {
    async fn generate_block(&mut self, proposal: &Proposal) -> Result<GeneratedBlock> {
        let span = self.span.clone();
        span.in_scope(|| self.generate(proposal))
    }

    fn rollback(&mut self) {
        if self.tx.take().is_some() {
            self.span
                .in_scope(|| trace!("generator transaction rolled back"));
        }
    }
}
