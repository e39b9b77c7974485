//! In-memory event store

use std::collections::HashMap;

use async_trait::async_trait;
use callguard_core::{QueryEvent, StoreResult};
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::store::EventStore;

/// Event store kept in process memory, keyed by phone number
#[derive(Debug, Default)]
pub struct MemoryEventStore {
    events: RwLock<HashMap<String, Vec<QueryEvent>>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored events
    pub async fn len(&self) -> usize {
        self.events.read().await.values().map(Vec::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn append(&self, event: &QueryEvent) -> StoreResult<()> {
        let mut events = self.events.write().await;
        events
            .entry(event.phone_number.clone())
            .or_default()
            .push(event.clone());
        Ok(())
    }

    async fn events_since(
        &self,
        phone_number: &str,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<QueryEvent>> {
        let events = self.events.read().await;
        Ok(events
            .get(phone_number)
            .map(|history| {
                history
                    .iter()
                    .filter(|e| e.is_since(since))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
