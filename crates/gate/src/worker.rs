//! Background evaluation worker

use std::sync::Arc;

use callguard_rules::Verdict;
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use uuid::Uuid;

use crate::error::RecorderError;
use crate::recorder::QueryRecorder;

/// One queued evaluation. The event is already durable.
#[derive(Debug)]
pub struct EvaluationJob {
    pub query_id: Uuid,
    pub phone_number: String,
    pub evaluated_at: DateTime<Utc>,
    pub completion: Option<oneshot::Sender<Result<Verdict, RecorderError>>>,
}

/// Drains the evaluation queue with bounded concurrency
pub struct EvaluationWorker {
    recorder: Arc<QueryRecorder>,
    receiver: mpsc::Receiver<EvaluationJob>,
    permits: Arc<Semaphore>,
}

impl EvaluationWorker {
    pub fn new(
        recorder: Arc<QueryRecorder>,
        receiver: mpsc::Receiver<EvaluationJob>,
        max_in_flight: usize,
    ) -> Self {
        Self {
            recorder,
            receiver,
            permits: Arc::new(Semaphore::new(max_in_flight.max(1))),
        }
    }

    pub fn spawn(self) -> WorkerHandle {
        WorkerHandle {
            handle: tokio::spawn(self.run()),
        }
    }

    /// Run until every sender is dropped, then finish in-flight evaluations
    pub async fn run(mut self) {
        tracing::info!("Evaluation worker started");
        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                job = self.receiver.recv() => {
                    let Some(job) = job else { break };
                    let Ok(permit) = self.permits.clone().acquire_owned().await else {
                        break;
                    };
                    let recorder = self.recorder.clone();
                    tasks.spawn(async move {
                        let _permit = permit;
                        process(&recorder, job).await;
                    });
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined {
                        tracing::error!(error = %e, "Evaluation task panicked");
                    }
                }
            }
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Evaluation task panicked");
            }
        }
        tracing::info!("Evaluation worker stopped");
    }
}

async fn process(recorder: &QueryRecorder, job: EvaluationJob) {
    let result = recorder
        .evaluate_and_promote(&job.phone_number, job.evaluated_at)
        .await;

    match &result {
        Ok(verdict) => tracing::debug!(
            query_id = %job.query_id,
            phone_number = %job.phone_number,
            verdict = ?verdict,
            "Evaluation finished"
        ),
        Err(e) => tracing::error!(
            query_id = %job.query_id,
            phone_number = %job.phone_number,
            error = %e,
            "Evaluation failed; query event stays recorded"
        ),
    }

    if let Some(completion) = job.completion {
        let _ = completion.send(result);
    }
}

/// Join handle for a spawned [`EvaluationWorker`]
pub struct WorkerHandle {
    handle: JoinHandle<()>,
}

impl WorkerHandle {
    /// Wait for the worker to drain. Returns once all gate handles are dropped.
    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            tracing::error!(error = %e, "Evaluation worker terminated abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callguard_blocklist::{BlockStore, MemoryBlockStore};
    use callguard_core::{QueryEvent, RuleConfig};
    use callguard_events::{EventStore, MemoryEventStore};
    use callguard_rules::RuleEvaluator;

    #[tokio::test]
    async fn test_worker_processes_jobs_and_drains_on_close() {
        let events = Arc::new(MemoryEventStore::new());
        let blocks = Arc::new(MemoryBlockStore::new());
        let recorder = Arc::new(QueryRecorder::new(
            events.clone(),
            blocks.clone(),
            RuleEvaluator::new(RuleConfig::default()),
        ));
        let now = Utc::now();
        for id in ["A", "B", "C"] {
            events
                .append(&QueryEvent::new("+56900000002", id, now))
                .await
                .unwrap();
        }

        let (tx, rx) = mpsc::channel(8);
        let handle = EvaluationWorker::new(recorder, rx, 2).spawn();

        let (done_tx, done_rx) = oneshot::channel();
        tx.send(EvaluationJob {
            query_id: Uuid::new_v4(),
            phone_number: "+56900000002".to_string(),
            evaluated_at: now,
            completion: Some(done_tx),
        })
        .await
        .unwrap();
        for _ in 0..4 {
            tx.send(EvaluationJob {
                query_id: Uuid::new_v4(),
                phone_number: "+56900000002".to_string(),
                evaluated_at: now,
                completion: None,
            })
            .await
            .unwrap();
        }

        assert_eq!(done_rx.await.unwrap().unwrap(), Verdict::Block);

        drop(tx);
        handle.join().await;

        assert!(blocks.is_blocked("+56900000002").await.unwrap());
        assert_eq!(blocks.len().await, 1);
    }
}
