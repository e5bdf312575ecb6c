//! # In-Memory Message Pool
//!
//! FIFO pool of one shard's pending messages.
//!
//! - `peek` never removes anything.
//! - Committed messages leave on `on_new_block`.
//! - Dropped messages go to the back of the queue; after
//!   [`DEFAULT_MAX_ATTEMPTS`] drops they are evicted.

use crate::errors::PoolError;
use crate::ports::MessagePool;
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{Block, Hash, Message};
use std::collections::VecDeque;
use tracing::{debug, info};

/// Default pool capacity.
pub const DEFAULT_POOL_CAPACITY: usize = 10_000;

/// Drops tolerated before a message is evicted.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone)]
struct PoolEntry {
    seq: u64,
    hash: Hash,
    msg: Message,
    attempts: u32,
}

#[derive(Debug, Default)]
struct PoolInner {
    queue: VecDeque<PoolEntry>,
    next_seq: u64,
}

impl PoolInner {
    fn position(&self, hash: &Hash) -> Option<usize> {
        self.queue.iter().position(|entry| entry.hash == *hash)
    }

    fn remove(&mut self, hash: &Hash) -> Option<PoolEntry> {
        let index = self.position(hash)?;
        self.queue.remove(index)
    }

    fn push(&mut self, mut entry: PoolEntry) {
        entry.seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push_back(entry);
    }
}

/// Pending messages of one shard, in arrival order.
#[derive(Debug)]
pub struct InMemoryMessagePool {
    inner: Mutex<PoolInner>,
    capacity: usize,
    max_attempts: u32,
}

impl Default for InMemoryMessagePool {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_CAPACITY)
    }
}

impl InMemoryMessagePool {
    /// Creates a pool holding at most `capacity` messages.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(PoolInner::default()),
            capacity,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Overrides how many drops a message survives.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Adds a message. Returns its hash.
    pub fn add(&self, msg: Message) -> Result<Hash, PoolError> {
        let hash = msg.hash();
        let mut inner = self.inner.lock();
        if inner.queue.len() >= self.capacity {
            return Err(PoolError::Full {
                capacity: self.capacity,
            });
        }
        if inner.position(&hash).is_some() {
            return Err(PoolError::Duplicate);
        }
        inner.push(PoolEntry {
            seq: 0,
            hash,
            msg,
            attempts: 0,
        });
        debug!(msg = %hash, pending = inner.queue.len(), "message pooled");
        Ok(hash)
    }

    /// Number of pending messages.
    pub fn len(&self) -> usize {
        self.inner.lock().queue.len()
    }

    /// Returns true if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().queue.is_empty()
    }

    /// Whether a message is pending.
    pub fn contains(&self, hash: &Hash) -> bool {
        self.inner.lock().position(hash).is_some()
    }
}

#[async_trait]
impl MessagePool for InMemoryMessagePool {
    async fn peek(&self, max_count: usize, since_seqno: u64) -> Result<Vec<Message>, PoolError> {
        let inner = self.inner.lock();
        Ok(inner
            .queue
            .iter()
            .filter(|entry| entry.seq >= since_seqno)
            .take(max_count)
            .map(|entry| entry.msg.clone())
            .collect())
    }

    async fn on_new_block(
        &self,
        block: &Block,
        committed: &[Message],
        dropped: Option<&[Hash]>,
    ) -> Result<(), PoolError> {
        let mut inner = self.inner.lock();
        let mut retired = 0usize;
        for msg in committed {
            if inner.remove(&msg.hash()).is_some() {
                retired += 1;
            }
        }

        let mut evicted = 0usize;
        for hash in dropped.unwrap_or_default() {
            let Some(mut entry) = inner.remove(hash) else {
                continue;
            };
            entry.attempts += 1;
            if entry.attempts >= self.max_attempts {
                info!(msg = %hash, attempts = entry.attempts, "message evicted after repeated drops");
                evicted += 1;
            } else {
                inner.push(entry);
            }
        }

        debug!(
            block = block.id,
            retired,
            evicted,
            pending = inner.queue.len(),
            "pool updated"
        );
        Ok(())
    }

    async fn reject(&self, hashes: &[Hash]) -> Result<(), PoolError> {
        let mut inner = self.inner.lock();
        for hash in hashes {
            if inner.remove(hash).is_some() {
                info!(msg = %hash, "message rejected from pool");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{Address, Gas};

    fn msg(seqno: u64) -> Message {
        Message {
            from: Address::on_shard(1, [1; 18]),
            to: Address::on_shard(1, [1; 18]),
            seqno,
            gas_limit: Gas(1_000),
            ..Message::default()
        }
    }

    #[tokio::test]
    async fn test_peek_is_non_destructive_and_ordered() {
        let pool = InMemoryMessagePool::default();
        for i in 0..5 {
            pool.add(msg(i)).unwrap();
        }

        let first = pool.peek(3, 0).await.unwrap();
        let again = pool.peek(3, 0).await.unwrap();
        assert_eq!(first, again);
        assert_eq!(first.iter().map(|m| m.seqno).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(pool.peek(10, 3).await.unwrap().len(), 2);
        assert_eq!(pool.len(), 5);
    }

    #[tokio::test]
    async fn test_duplicates_and_capacity() {
        let pool = InMemoryMessagePool::new(2);
        pool.add(msg(0)).unwrap();
        assert_eq!(pool.add(msg(0)), Err(PoolError::Duplicate));
        pool.add(msg(1)).unwrap();
        assert_eq!(pool.add(msg(2)), Err(PoolError::Full { capacity: 2 }));
    }

    #[tokio::test]
    async fn test_committed_retire_and_dropped_requeue() {
        let pool = InMemoryMessagePool::default().with_max_attempts(2);
        let a = pool.add(msg(0)).unwrap();
        let b = pool.add(msg(1)).unwrap();
        let c = pool.add(msg(2)).unwrap();

        let block = Block::zerostate(1);
        pool.on_new_block(&block, &[msg(0)], Some(&[b][..])).await.unwrap();
        assert!(!pool.contains(&a));
        let order: Vec<_> = pool.peek(10, 0).await.unwrap().iter().map(Message::hash).collect();
        assert_eq!(order, vec![c, b]);

        pool.on_new_block(&block, &[], Some(&[b][..])).await.unwrap();
        assert!(!pool.contains(&b));
        assert_eq!(pool.len(), 1);
    }

    #[tokio::test]
    async fn test_reject_evicts() {
        let pool = InMemoryMessagePool::default();
        let a = pool.add(msg(0)).unwrap();
        pool.reject(&[a]).await.unwrap();
        assert!(pool.is_empty());
    }
}
