//! # Block Listener

use crate::errors::PropagationError;
use shared_bus::{NetworkManager, Topic};
use shared_types::{Block, ShardId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, info_span, warn, Span};

/// Follows a shard's block topic until shutdown.
pub struct BlockListener {
    network: Arc<dyn NetworkManager>,
    topic: Topic,
    received: Arc<AtomicU64>,
    span: Span,
}

impl BlockListener {
    /// Creates a listener for `shard_id`.
    pub fn new(shard_id: ShardId, network: Arc<dyn NetworkManager>) -> Self {
        Self {
            network,
            topic: Topic::shard_blocks(shard_id),
            received: Arc::new(AtomicU64::new(0)),
            span: info_span!("block_listener", shard = shard_id),
        }
    }

    /// Counter of blocks decoded so far.
    pub fn received_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.received)
    }

    /// Receives blocks until `shutdown` flips or the network closes.
    ///
    /// Undecodable payloads are logged and skipped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<(), PropagationError> {
        let mut subscription = self.network.subscribe(&self.topic)?;
        self.span
            .in_scope(|| info!(topic = %self.topic, "listening for blocks"));

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                payload = subscription.recv() => {
                    let Some(payload) = payload else {
                        self.span.in_scope(|| info!("network closed, listener stopping"));
                        break;
                    };
                    self.on_payload(&payload);
                }
            }
        }
        self.span.in_scope(|| info!("listener stopped"));
        Ok(())
    }

    fn on_payload(&self, payload: &[u8]) {
        let _entered = self.span.enter();
        match Block::decode(payload) {
            Ok(block) => {
                self.received.fetch_add(1, Ordering::Relaxed);
                info!(
                    block = block.id,
                    hash = %block.hash(),
                    "block received"
                );
            }
            Err(err) => warn!(error = %err, bytes = payload.len(), "undecodable block payload"),
        }
    }
}
