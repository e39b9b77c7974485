//! End-to-end gate scenarios

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use callguard_blocklist::{BlockStore, MemoryBlockStore, SqliteBlockStore};
use callguard_core::{BlockEntry, BlockOutcome, QueryEvent, RuleConfig, StoreError, StoreResult};
use callguard_events::{EventStore, JournalEventStore, MemoryEventStore};
use callguard_gate::{
    Decision, FailPolicy, FraudGate, GateConfig, GateError, QueryRecorder, RecorderError,
    RetryPolicy,
};
use callguard_rules::{RuleEvaluator, Verdict};
use chrono::{DateTime, Duration, Utc};
use tempfile::tempdir;

fn memory_recorder() -> (Arc<QueryRecorder>, Arc<MemoryEventStore>, Arc<MemoryBlockStore>) {
    let events = Arc::new(MemoryEventStore::new());
    let blocks = Arc::new(MemoryBlockStore::new());
    let recorder = Arc::new(
        QueryRecorder::new(
            events.clone(),
            blocks.clone(),
            RuleEvaluator::new(RuleConfig::default()),
        )
        .with_retry(RetryPolicy::new(3, StdDuration::ZERO)),
    );
    (recorder, events, blocks)
}

async fn submit_and_wait(
    gate: &FraudGate,
    phone_number: &str,
    national_id: &str,
    at: DateTime<Utc>,
) -> Verdict {
    let ack = gate.submit_query_at(phone_number, national_id, at).await.unwrap();
    ack.wait().await.unwrap().unwrap()
}

// === Failure-injecting stores ===

/// Event store that refuses every append
struct BrokenEventStore;

#[async_trait]
impl EventStore for BrokenEventStore {
    async fn append(&self, _event: &QueryEvent) -> StoreResult<()> {
        Err(StoreError::Unavailable("journal offline".into()))
    }

    async fn events_since(&self, _phone: &str, _since: DateTime<Utc>) -> StoreResult<Vec<QueryEvent>> {
        Err(StoreError::Unavailable("journal offline".into()))
    }
}

/// Event store that fails the first `failures` appends
struct FlakyEventStore {
    inner: MemoryEventStore,
    failures: u32,
    calls: AtomicU32,
}

#[async_trait]
impl EventStore for FlakyEventStore {
    async fn append(&self, event: &QueryEvent) -> StoreResult<()> {
        if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
            return Err(StoreError::Unavailable("timeout".into()));
        }
        self.inner.append(event).await
    }

    async fn events_since(&self, phone: &str, since: DateTime<Utc>) -> StoreResult<Vec<QueryEvent>> {
        self.inner.events_since(phone, since).await
    }
}

/// Block store whose reads work but writes fail
struct ReadOnlyBlockStore;

#[async_trait]
impl BlockStore for ReadOnlyBlockStore {
    async fn is_blocked(&self, _phone: &str) -> StoreResult<bool> {
        Ok(false)
    }

    async fn block_if_absent(&self, _entry: &BlockEntry) -> StoreResult<BlockOutcome> {
        Err(StoreError::Unavailable("write quorum lost".into()))
    }

    async fn get(&self, _phone: &str) -> StoreResult<Option<BlockEntry>> {
        Ok(None)
    }
}

/// Block store that never answers in time
struct StalledBlockStore;

#[async_trait]
impl BlockStore for StalledBlockStore {
    async fn is_blocked(&self, _phone: &str) -> StoreResult<bool> {
        tokio::time::sleep(StdDuration::from_secs(5)).await;
        Ok(false)
    }

    async fn block_if_absent(&self, _entry: &BlockEntry) -> StoreResult<BlockOutcome> {
        Ok(BlockOutcome::Inserted)
    }

    async fn get(&self, _phone: &str) -> StoreResult<Option<BlockEntry>> {
        Ok(None)
    }
}

// === Rule scenarios ===

#[tokio::test]
async fn test_two_distinct_ids_stay_allowed() {
    let (recorder, _events, blocks) = memory_recorder();
    let (gate, _worker) = FraudGate::start(recorder, &GateConfig::default());
    let now = Utc::now();

    assert_eq!(submit_and_wait(&gate, "+56900000001", "A", now).await, Verdict::Allow);
    assert_eq!(submit_and_wait(&gate, "+56900000001", "B", now).await, Verdict::Allow);

    assert_eq!(gate.decide("+56900000001").await, Decision::Allowed);
    assert!(blocks.is_empty().await);
}

#[tokio::test]
async fn test_burst_of_three_ids_blocks() {
    let (recorder, _events, blocks) = memory_recorder();
    let (gate, _worker) = FraudGate::start(recorder, &GateConfig::default());
    let now = Utc::now();

    for id in ["A", "B", "C"] {
        submit_and_wait(&gate, "+56900000002", id, now).await;
    }

    assert_eq!(gate.decide("+56900000002").await, Decision::Blocked);
    let entry = blocks.get("+56900000002").await.unwrap().unwrap();
    assert!(entry.reason.starts_with("Automatic block (rule:"));
}

#[tokio::test]
async fn test_ids_spread_over_month_block() {
    let (recorder, _events, _blocks) = memory_recorder();
    let (gate, _worker) = FraudGate::start(recorder, &GateConfig::default());
    let now = Utc::now();

    submit_and_wait(&gate, "+56900000003", "A", now - Duration::days(28)).await;
    submit_and_wait(&gate, "+56900000003", "B", now - Duration::days(14)).await;
    let verdict = submit_and_wait(&gate, "+56900000003", "C", now).await;

    assert_eq!(verdict, Verdict::Block);
    assert_eq!(gate.decide("+56900000003").await, Decision::Blocked);
}

#[tokio::test]
async fn test_same_id_repeated_stays_allowed() {
    let (recorder, events, blocks) = memory_recorder();
    let (gate, _worker) = FraudGate::start(recorder, &GateConfig::default());
    let now = Utc::now();

    for _ in 0..5 {
        submit_and_wait(&gate, "+56900000004", "A", now).await;
    }

    assert_eq!(gate.decide("+56900000004").await, Decision::Allowed);
    assert_eq!(events.len().await, 5);
    assert!(blocks.is_empty().await);
}

#[tokio::test]
async fn test_check_does_not_see_queries_until_promoted() {
    let (recorder, _events, _blocks) = memory_recorder();
    let (gate, _worker) = FraudGate::start(recorder, &GateConfig::default());

    // Check path only reads the block list: history alone never blocks
    assert_eq!(gate.decide("+56900000009").await, Decision::Allowed);
}

// === Concurrency ===

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_queries_write_one_block_entry() {
    let (recorder, events, blocks) = memory_recorder();
    let (gate, _worker) = FraudGate::start(recorder, &GateConfig::default());
    let now = Utc::now();

    let mut handles = Vec::new();
    for i in 0..12 {
        let gate = gate.clone();
        handles.push(tokio::spawn(async move {
            let id = format!("ID-{}", i);
            let ack = gate.submit_query_at("+56900000010", &id, now).await.unwrap();
            ack.wait().await
        }));
    }

    for handle in handles {
        let result = handle.await.unwrap().unwrap();
        assert!(result.is_ok());
    }

    assert_eq!(events.len().await, 12);
    assert_eq!(blocks.len().await, 1);
    assert_eq!(gate.decide("+56900000010").await, Decision::Blocked);
}

#[tokio::test]
async fn test_worker_drains_after_gate_dropped() {
    let (recorder, _events, blocks) = memory_recorder();
    let (gate, worker) = FraudGate::start(recorder, &GateConfig::default());
    let now = Utc::now();

    for id in ["A", "B", "C"] {
        let ack = gate.submit_query_at("+56900000011", id, now).await.unwrap();
        assert!(ack.evaluation_queued);
    }
    drop(gate);
    worker.join().await;

    assert!(blocks.is_blocked("+56900000011").await.unwrap());
}

// === Failure handling ===

#[tokio::test]
async fn test_append_failure_is_not_acknowledged() {
    let blocks = Arc::new(MemoryBlockStore::new());
    let recorder = Arc::new(
        QueryRecorder::new(
            Arc::new(BrokenEventStore),
            blocks.clone(),
            RuleEvaluator::new(RuleConfig::default()),
        )
        .with_retry(RetryPolicy::new(2, StdDuration::ZERO)),
    );
    let (gate, _worker) = FraudGate::start(recorder, &GateConfig::default());

    let err = gate.submit_query("+56900000012", "A").await.unwrap_err();
    match err {
        GateError::Recording(inner) => {
            assert!(matches!(inner, RecorderError::AppendFailed(_)));
            assert!(!inner.event_recorded());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(blocks.is_empty().await);
}

#[tokio::test]
async fn test_transient_append_failures_are_retried() {
    let events = Arc::new(FlakyEventStore {
        inner: MemoryEventStore::new(),
        failures: 2,
        calls: AtomicU32::new(0),
    });
    let recorder = Arc::new(
        QueryRecorder::new(
            events.clone(),
            Arc::new(MemoryBlockStore::new()),
            RuleEvaluator::new(RuleConfig::default()),
        )
        .with_retry(RetryPolicy::new(3, StdDuration::ZERO)),
    );
    let (gate, _worker) = FraudGate::start(recorder, &GateConfig::default());

    let ack = gate.submit_query("+56900000013", "A").await.unwrap();
    assert_eq!(ack.wait().await.unwrap().unwrap(), Verdict::Allow);
    assert_eq!(events.inner.len().await, 1);
    assert_eq!(events.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_block_write_failure_keeps_event() {
    let events = Arc::new(MemoryEventStore::new());
    let recorder = Arc::new(
        QueryRecorder::new(
            events.clone(),
            Arc::new(ReadOnlyBlockStore),
            RuleEvaluator::new(RuleConfig::default()),
        )
        .with_retry(RetryPolicy::none()),
    );
    let (gate, _worker) = FraudGate::start(recorder, &GateConfig::default());
    let now = Utc::now();

    submit_and_wait(&gate, "+56900000014", "A", now).await;
    submit_and_wait(&gate, "+56900000014", "B", now).await;
    let ack = gate.submit_query_at("+56900000014", "C", now).await.unwrap();
    let err = ack.wait().await.unwrap().unwrap_err();

    assert!(matches!(err, RecorderError::BlockWriteFailed(_)));
    assert!(err.event_recorded());
    assert_eq!(events.len().await, 3);
}

#[tokio::test]
async fn test_stalled_block_store_applies_fail_policy() {
    fn recorder(blocks: Arc<dyn BlockStore>) -> Arc<QueryRecorder> {
        Arc::new(QueryRecorder::new(
            Arc::new(MemoryEventStore::new()),
            blocks,
            RuleEvaluator::new(RuleConfig::default()),
        ))
    }

    let closed = GateConfig {
        check_timeout_ms: 20,
        ..GateConfig::default()
    };
    let (gate, _worker) = FraudGate::start(recorder(Arc::new(StalledBlockStore)), &closed);
    assert!(matches!(
        gate.check_phone_number("+56900000015").await,
        Err(GateError::StatusUnknown(_))
    ));
    assert_eq!(gate.decide("+56900000015").await, Decision::Blocked);

    let open = GateConfig {
        check_timeout_ms: 20,
        fail_policy: FailPolicy::FailOpen,
        ..GateConfig::default()
    };
    let (gate, _worker) = FraudGate::start(recorder(Arc::new(StalledBlockStore)), &open);
    assert_eq!(gate.decide("+56900000015").await, Decision::Allowed);
}

// === Persistent backends ===

#[tokio::test]
async fn test_journal_and_sqlite_end_to_end() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let events = Arc::new(JournalEventStore::open(dir.path().join("queries"))?);
    let blocks = Arc::new(SqliteBlockStore::open(dir.path().join("blocklist.db")).await?);
    let recorder = Arc::new(QueryRecorder::new(
        events.clone(),
        blocks.clone(),
        RuleEvaluator::new(RuleConfig::default()),
    ));
    let (gate, worker) = FraudGate::start(recorder, &GateConfig::default());
    let now = Utc::now();

    submit_and_wait(&gate, "+56900000003", "A", now - Duration::days(28)).await;
    submit_and_wait(&gate, "+56900000003", "B", now - Duration::days(14)).await;
    submit_and_wait(&gate, "+56900000003", "C", now).await;
    drop(gate);
    worker.join().await;

    // Reopen both stores: state survives a restart
    let events = JournalEventStore::open(dir.path().join("queries"))?;
    let blocks = SqliteBlockStore::open(dir.path().join("blocklist.db")).await?;

    let history = events
        .events_since("+56900000003", now - Duration::days(30))
        .await?;
    assert_eq!(history.len(), 3);
    assert!(blocks.is_blocked("+56900000003").await?);

    Ok(())
}
