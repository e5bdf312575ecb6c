//! # Network Publisher
//!
//! Defines the publishing side of the network transport.

use crate::subscriber::Subscription;
use crate::topics::Topic;
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Errors from the network transport.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// The transport has been shut down.
    #[error("network closed")]
    Closed,

    /// The transport rejected the topic.
    #[error("invalid topic: {0}")]
    InvalidTopic(String),
}

/// Topic-scoped publish/subscribe transport.
#[async_trait]
pub trait NetworkManager: Send + Sync {
    /// Publish a payload on a topic.
    ///
    /// Returns the number of local subscribers that received it. Publishing
    /// with no subscribers is not an error.
    async fn publish(&self, topic: &Topic, payload: Vec<u8>) -> Result<usize, NetworkError>;

    /// Subscribe to a topic.
    fn subscribe(&self, topic: &Topic) -> Result<Subscription, NetworkError>;
}

/// In-memory network.
///
/// Uses one `tokio::sync::broadcast` channel per topic for multi-producer,
/// multi-consumer semantics inside a single process.
pub struct InMemoryNetwork {
    /// Broadcast sender per topic, created on first use.
    topics: RwLock<HashMap<Topic, broadcast::Sender<Vec<u8>>>>,

    /// Total payloads published.
    published: AtomicU64,

    /// Channel capacity per topic.
    capacity: usize,
}

impl InMemoryNetwork {
    /// Create a network with default per-topic capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a network with the given per-topic capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Number of live subscribers on a topic.
    #[must_use]
    pub fn subscriber_count(&self, topic: &Topic) -> usize {
        self.topics
            .read()
            .get(topic)
            .map_or(0, broadcast::Sender::receiver_count)
    }

    /// Total payloads published across all topics.
    #[must_use]
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    fn sender(&self, topic: &Topic) -> broadcast::Sender<Vec<u8>> {
        if let Some(sender) = self.topics.read().get(topic) {
            return sender.clone();
        }
        self.topics
            .write()
            .entry(topic.clone())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }
}

impl Default for InMemoryNetwork {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NetworkManager for InMemoryNetwork {
    async fn publish(&self, topic: &Topic, payload: Vec<u8>) -> Result<usize, NetworkError> {
        if topic.as_str().is_empty() {
            return Err(NetworkError::InvalidTopic(String::new()));
        }
        self.published.fetch_add(1, Ordering::Relaxed);

        let bytes = payload.len();
        match self.sender(topic).send(payload) {
            Ok(receivers) => {
                debug!(%topic, bytes, receivers, "Payload published");
                Ok(receivers)
            }
            Err(_) => {
                trace!(%topic, bytes, "Payload dropped (no subscribers)");
                Ok(0)
            }
        }
    }

    fn subscribe(&self, topic: &Topic) -> Result<Subscription, NetworkError> {
        if topic.as_str().is_empty() {
            return Err(NetworkError::InvalidTopic(String::new()));
        }
        let receiver = self.sender(topic).subscribe();
        debug!(%topic, "New subscription created");
        Ok(Subscription::new(topic.clone(), receiver))
    }
}
