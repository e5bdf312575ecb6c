//! # Block Publisher

use crate::errors::PropagationError;
use shared_bus::{NetworkManager, Topic};
use shared_types::{Block, ShardId};
use std::sync::Arc;
use tracing::{debug, info_span, Instrument, Span};

/// Publishes a shard's blocks to its topic.
///
/// Without a network the publisher is a no-op.
pub struct BlockPublisher {
    network: Option<Arc<dyn NetworkManager>>,
    topic: Topic,
    span: Span,
}

impl BlockPublisher {
    /// Creates a publisher for `shard_id`.
    pub fn new(shard_id: ShardId, network: Option<Arc<dyn NetworkManager>>) -> Self {
        Self {
            network,
            topic: Topic::shard_blocks(shard_id),
            span: info_span!("block_publisher", shard = shard_id),
        }
    }

    /// Topic blocks are published on.
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    /// Encodes and publishes `block`.
    pub async fn publish(&self, block: &Block) -> Result<(), PropagationError> {
        let Some(network) = &self.network else {
            return Ok(());
        };
        let payload = block.encode()?;
        let size = payload.len();
        let delivered = network
            .publish(&self.topic, payload)
            .instrument(self.span.clone())
            .await?;
        self.span.in_scope(|| {
            debug!(
                block = block.id,
                bytes = size,
                subscribers = delivered,
                "block published"
            );
        });
        Ok(())
    }
}
