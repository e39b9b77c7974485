//! Fraud Gate: synchronous check path, asynchronous record path

use std::sync::Arc;
use std::time::Duration;

use callguard_blocklist::BlockStore;
use callguard_core::QueryEvent;
use callguard_rules::Verdict;
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

use crate::config::{FailPolicy, GateConfig};
use crate::decision::Decision;
use crate::error::{GateError, GateResult, RecorderError};
use crate::recorder::QueryRecorder;
use crate::worker::{EvaluationJob, EvaluationWorker, WorkerHandle};

/// Returned once a query event is durable
#[derive(Debug)]
pub struct Acknowledgement {
    pub query_id: Uuid,
    pub received_at: DateTime<Utc>,
    /// False if the queue was full or closed; the next query for the same
    /// number re-evaluates the whole history anyway.
    pub evaluation_queued: bool,
    completion: Option<oneshot::Receiver<Result<Verdict, RecorderError>>>,
}

impl Acknowledgement {
    /// Wait for the background evaluation of this query.
    ///
    /// `None` if the evaluation was never queued or the worker dropped it.
    pub async fn wait(self) -> Option<Result<Verdict, RecorderError>> {
        self.completion?.await.ok()
    }
}

/// Cheap to clone; all clones share one evaluation queue
#[derive(Clone)]
pub struct FraudGate {
    recorder: Arc<QueryRecorder>,
    blocks: Arc<dyn BlockStore>,
    jobs: mpsc::Sender<EvaluationJob>,
    check_timeout: Duration,
    fail_policy: FailPolicy,
}

impl FraudGate {
    /// Build the gate and spawn its evaluation worker.
    ///
    /// The worker stops once every clone of the gate is dropped.
    pub fn start(recorder: Arc<QueryRecorder>, config: &GateConfig) -> (Self, WorkerHandle) {
        let (jobs, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let worker = EvaluationWorker::new(recorder.clone(), receiver, config.max_in_flight);
        let handle = worker.spawn();

        let gate = Self {
            blocks: recorder.blocks().clone(),
            recorder,
            jobs,
            check_timeout: config.check_timeout(),
            fail_policy: config.fail_policy,
        };

        tracing::info!(
            queue_capacity = config.queue_capacity,
            max_in_flight = config.max_in_flight,
            check_timeout_ms = config.check_timeout_ms,
            fail_policy = ?config.fail_policy,
            "Fraud gate started"
        );
        (gate, handle)
    }

    pub fn recorder(&self) -> &Arc<QueryRecorder> {
        &self.recorder
    }

    pub fn fail_policy(&self) -> FailPolicy {
        self.fail_policy
    }

    /// Block list lookup only. Never reads the event store.
    pub async fn check_phone_number(&self, phone_number: &str) -> GateResult<Decision> {
        match tokio::time::timeout(self.check_timeout, self.blocks.is_blocked(phone_number)).await
        {
            Ok(Ok(blocked)) => Ok(Decision::from(blocked)),
            Ok(Err(e)) => Err(GateError::StatusUnknown(e.to_string())),
            Err(_) => Err(GateError::StatusUnknown(format!(
                "block list lookup exceeded {}ms",
                self.check_timeout.as_millis()
            ))),
        }
    }

    /// Check with the fail policy applied
    pub async fn decide(&self, phone_number: &str) -> Decision {
        match self.check_phone_number(phone_number).await {
            Ok(decision) => {
                tracing::info!(phone_number, decision = ?decision, "Phone number checked");
                decision
            }
            Err(e) => {
                let decision = self.fail_policy.resolve();
                tracing::error!(
                    phone_number,
                    error = %e,
                    fail_policy = ?self.fail_policy,
                    decision = ?decision,
                    "Block status unknown, applying fail policy"
                );
                decision
            }
        }
    }

    /// Record a query received now
    pub async fn submit_query(
        &self,
        phone_number: &str,
        national_id: &str,
    ) -> GateResult<Acknowledgement> {
        self.submit_query_at(phone_number, national_id, Utc::now()).await
    }

    /// Record a query with an explicit timestamp.
    ///
    /// Returns after the event is durable. Evaluation and promotion run on
    /// the worker; the result only affects later checks.
    pub async fn submit_query_at(
        &self,
        phone_number: &str,
        national_id: &str,
        at: DateTime<Utc>,
    ) -> GateResult<Acknowledgement> {
        let event = QueryEvent::new(phone_number, national_id, at);
        self.recorder.append(&event).await?;

        let query_id = Uuid::new_v4();
        let (completion_tx, completion_rx) = oneshot::channel();
        let job = EvaluationJob {
            query_id,
            phone_number: phone_number.to_string(),
            evaluated_at: at,
            completion: Some(completion_tx),
        };

        let (evaluation_queued, completion) = match self.jobs.try_send(job) {
            Ok(()) => (true, Some(completion_rx)),
            Err(TrySendError::Full(_)) => {
                tracing::warn!(
                    %query_id,
                    phone_number,
                    "Evaluation queue full, deferring to next query"
                );
                (false, None)
            }
            Err(TrySendError::Closed(_)) => {
                tracing::warn!(
                    %query_id,
                    phone_number,
                    "Evaluation worker stopped, deferring to next query"
                );
                (false, None)
            }
        };

        Ok(Acknowledgement {
            query_id,
            received_at: at,
            evaluation_queued,
            completion,
        })
    }
}
