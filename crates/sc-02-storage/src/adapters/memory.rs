use crate::errors::Result;
use crate::ports::{RoTx, RwTx, Storage, Table};
use parking_lot::RwLock;
use shared_types::ShardId;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::trace;

type Key = (Table, Option<ShardId>, Vec<u8>);
type Entries = BTreeMap<Key, Vec<u8>>;

/// In-memory transactional store.
///
/// Read-write transactions buffer their writes in an overlay and apply it
/// under one write lock on commit. Single-process nodes and tests use it;
/// production plugs a persistent engine into the same ports.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    data: Arc<RwLock<Entries>>,
}

impl MemoryStorage {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed entries.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Returns true if nothing has been committed.
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn begin_ro(&self) -> Result<Box<dyn RoTx>> {
        Ok(Box::new(MemoryRoTx {
            data: Arc::clone(&self.data),
        }))
    }

    fn begin_rw(&self) -> Result<Box<dyn RwTx>> {
        Ok(Box::new(MemoryRwTx {
            data: Arc::clone(&self.data),
            overlay: BTreeMap::new(),
            committed: false,
        }))
    }
}

fn scan(entries: &Entries, shard_id: ShardId, table: Table, prefix: &[u8]) -> Entries {
    let start: Key = (table, Some(shard_id), prefix.to_vec());
    entries
        .range(start..)
        .take_while(|((t, s, k), _)| *t == table && *s == Some(shard_id) && k.starts_with(prefix))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

struct MemoryRoTx {
    data: Arc<RwLock<Entries>>,
}

impl RoTx for MemoryRoTx {
    fn get(&self, table: Table, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.data.read().get(&(table, None, key.to_vec())).cloned())
    }

    fn get_from_shard(
        &self,
        shard_id: ShardId,
        table: Table,
        key: &[u8],
    ) -> Result<Option<Vec<u8>>> {
        Ok(self
            .data
            .read()
            .get(&(table, Some(shard_id), key.to_vec()))
            .cloned())
    }

    fn scan_shard(
        &self,
        shard_id: ShardId,
        table: Table,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let found = scan(&self.data.read(), shard_id, table, prefix);
        Ok(found.into_iter().map(|((_, _, k), v)| (k, v)).collect())
    }
}

struct MemoryRwTx {
    data: Arc<RwLock<Entries>>,
    /// Buffered writes; `None` marks a deletion.
    overlay: BTreeMap<Key, Option<Vec<u8>>>,
    committed: bool,
}

impl MemoryRwTx {
    fn lookup(&self, key: Key) -> Option<Vec<u8>> {
        match self.overlay.get(&key) {
            Some(buffered) => buffered.clone(),
            None => self.data.read().get(&key).cloned(),
        }
    }
}

impl RoTx for MemoryRwTx {
    fn get(&self, table: Table, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.lookup((table, None, key.to_vec())))
    }

    fn get_from_shard(
        &self,
        shard_id: ShardId,
        table: Table,
        key: &[u8],
    ) -> Result<Option<Vec<u8>>> {
        Ok(self.lookup((table, Some(shard_id), key.to_vec())))
    }

    fn scan_shard(
        &self,
        shard_id: ShardId,
        table: Table,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut found = scan(&self.data.read(), shard_id, table, prefix);
        let start: Key = (table, Some(shard_id), prefix.to_vec());
        let buffered = self
            .overlay
            .range(start..)
            .take_while(|((t, s, k), _)| *t == table && *s == Some(shard_id) && k.starts_with(prefix));
        for (key, value) in buffered {
            match value {
                Some(value) => {
                    found.insert(key.clone(), value.clone());
                }
                None => {
                    found.remove(key);
                }
            }
        }
        Ok(found.into_iter().map(|((_, _, k), v)| (k, v)).collect())
    }
}

impl RwTx for MemoryRwTx {
    fn put(&mut self, table: Table, key: &[u8], value: Vec<u8>) -> Result<()> {
        self.overlay.insert((table, None, key.to_vec()), Some(value));
        Ok(())
    }

    fn put_to_shard(
        &mut self,
        shard_id: ShardId,
        table: Table,
        key: &[u8],
        value: Vec<u8>,
    ) -> Result<()> {
        self.overlay
            .insert((table, Some(shard_id), key.to_vec()), Some(value));
        Ok(())
    }

    fn delete_from_shard(&mut self, shard_id: ShardId, table: Table, key: &[u8]) -> Result<()> {
        self.overlay.insert((table, Some(shard_id), key.to_vec()), None);
        Ok(())
    }

    fn commit(mut self: Box<Self>) -> Result<()> {
        let writes = std::mem::take(&mut self.overlay);
        let count = writes.len();
        {
            let mut data = self.data.write();
            for (key, value) in writes {
                match value {
                    Some(value) => {
                        data.insert(key, value);
                    }
                    None => {
                        data.remove(&key);
                    }
                }
            }
        }
        self.committed = true;
        trace!(writes = count, "transaction committed");
        Ok(())
    }

    fn as_ro(&self) -> &dyn RoTx {
        self
    }
}

impl Drop for MemoryRwTx {
    fn drop(&mut self) {
        if !self.committed && !self.overlay.is_empty() {
            trace!(
                discarded = self.overlay.len(),
                "transaction rolled back"
            );
        }
    }
}
