//! Out-message lookup over committed storage.

use crate::errors::StateError;
use crate::ports::OutMessageLookup;
use sc_02_storage::{tries, Storage};
use shared_types::{Hash, Message, ShardId};
use std::sync::Arc;

/// Looks out-messages up in committed storage.
///
/// Each lookup opens its own read-only transaction, so messages committed
/// by other shards after the block attempt started are visible.
#[derive(Clone)]
pub struct StorageMessageLookup {
    storage: Arc<dyn Storage>,
}

impl StorageMessageLookup {
    /// Creates a lookup over `storage`.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }
}

impl OutMessageLookup for StorageMessageLookup {
    fn find_out_message(
        &self,
        shard_id: ShardId,
        hash: &Hash,
    ) -> Result<Option<Message>, StateError> {
        let tx = self.storage.begin_ro()?;
        Ok(tries::find_out_message(tx.as_ref(), shard_id, hash)?)
    }
}
