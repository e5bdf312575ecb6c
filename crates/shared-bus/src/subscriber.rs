//! # Network Subscriber
//!
//! Defines the subscription side of the network transport.

use crate::topics::Topic;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug;

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The network was closed.
    #[error("network closed")]
    Closed,
}

/// A subscription handle for receiving payloads on one topic.
pub struct Subscription {
    topic: Topic,
    receiver: broadcast::Receiver<Vec<u8>>,
}

impl Subscription {
    pub(crate) fn new(topic: Topic, receiver: broadcast::Receiver<Vec<u8>>) -> Self {
        Self { topic, receiver }
    }

    /// Receive the next payload.
    ///
    /// # Returns
    ///
    /// - `Some(payload)` - The next payload on the topic
    /// - `None` - The channel was closed (network dropped)
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        loop {
            match self.receiver.recv().await {
                Ok(payload) => return Some(payload),
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    debug!(topic = %self.topic, lagged = count, "Subscriber lagged, payloads dropped");
                }
            }
        }
    }

    /// Try to receive the next payload without blocking.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(payload))` - A payload was available
    /// - `Ok(None)` - No payload available (would block)
    /// - `Err(SubscriptionError::Closed)` - The channel was closed
    pub fn try_recv(&mut self) -> Result<Option<Vec<u8>>, SubscriptionError> {
        loop {
            match self.receiver.try_recv() {
                Ok(payload) => return Ok(Some(payload)),
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            }
        }
    }

    /// The subscribed topic.
    #[must_use]
    pub fn topic(&self) -> &Topic {
        &self.topic
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        debug!(topic = %self.topic, "Subscription dropped");
    }
}
