//! Application state and store wiring

use std::sync::Arc;

use callguard_blocklist::{BlockStore, MemoryBlockStore, SqliteBlockStore};
use callguard_core::StoreResult;
use callguard_events::{EventStore, JournalEventStore, MemoryEventStore};
use callguard_gate::{FraudGate, QueryRecorder, RetryPolicy, WorkerHandle};
use callguard_rules::RuleEvaluator;

use crate::config::{CallGuardConfig, StorageBackend, StorageConfig};

/// Event store and block store selected by `[storage]`
#[derive(Clone)]
pub struct Stores {
    pub events: Arc<dyn EventStore>,
    pub blocks: Arc<dyn BlockStore>,
}

impl Stores {
    pub fn memory() -> Self {
        Self {
            events: Arc::new(MemoryEventStore::new()),
            blocks: Arc::new(MemoryBlockStore::new()),
        }
    }

    pub async fn open(storage: &StorageConfig) -> StoreResult<Self> {
        match storage.backend {
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; state is lost on restart");
                Ok(Self::memory())
            }
            StorageBackend::Disk => {
                let events = JournalEventStore::open(storage.journal_dir())?;
                let blocks = SqliteBlockStore::open(storage.blocklist_path()).await?;
                tracing::info!(
                    journal = %storage.journal_dir().display(),
                    blocklist = %storage.blocklist_path().display(),
                    "Opened disk storage"
                );
                Ok(Self {
                    events: Arc::new(events),
                    blocks: Arc::new(blocks),
                })
            }
        }
    }
}

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub gate: FraudGate,
}

impl AppState {
    /// Build the recorder and gate, spawning the evaluation worker
    pub fn start(config: &CallGuardConfig, stores: Stores) -> (Self, WorkerHandle) {
        let recorder = QueryRecorder::new(
            stores.events,
            stores.blocks,
            RuleEvaluator::new(config.rules.clone()),
        )
        .with_retry(RetryPolicy::from(&config.recorder));

        let (gate, worker) = FraudGate::start(Arc::new(recorder), &config.gate);
        (Self { gate }, worker)
    }
}
