//! In-memory block store

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use async_trait::async_trait;
use callguard_core::{BlockEntry, BlockOutcome, StoreResult};
use tokio::sync::RwLock;

use crate::store::BlockStore;

/// Block list held in process memory.
///
/// The conditional insert runs under the write lock, which makes it atomic.
#[derive(Debug, Default)]
pub struct MemoryBlockStore {
    entries: RwLock<HashMap<String, BlockEntry>>,
}

impl MemoryBlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blocked phone numbers
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl BlockStore for MemoryBlockStore {
    async fn is_blocked(&self, phone_number: &str) -> StoreResult<bool> {
        Ok(self.entries.read().await.contains_key(phone_number))
    }

    async fn block_if_absent(&self, entry: &BlockEntry) -> StoreResult<BlockOutcome> {
        let mut entries = self.entries.write().await;
        match entries.entry(entry.phone_number.clone()) {
            Entry::Occupied(_) => Ok(BlockOutcome::AlreadyBlocked),
            Entry::Vacant(slot) => {
                slot.insert(entry.clone());
                Ok(BlockOutcome::Inserted)
            }
        }
    }

    async fn get(&self, phone_number: &str) -> StoreResult<Option<BlockEntry>> {
        Ok(self.entries.read().await.get(phone_number).cloned())
    }
}
