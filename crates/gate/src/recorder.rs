//! Query Recorder
//!
//! Owns the record-and-evaluate sequence for one query:
//!
//! 1. append the event (must succeed before anything else happens)
//! 2. read the phone number's history for the widest window
//! 3. evaluate the rule
//! 4. on `Block`, promote with an atomic `block_if_absent`
//!
//! Every step after the append is idempotent, so the whole sequence may be
//! re-run for the same phone number at any time.

use std::sync::Arc;

use callguard_blocklist::BlockStore;
use callguard_core::{BlockEntry, BlockOutcome, QueryEvent};
use callguard_events::EventStore;
use callguard_rules::{Evaluation, RuleEvaluator, Verdict};
use chrono::{DateTime, Utc};

use crate::error::RecorderError;
use crate::retry::RetryPolicy;

pub struct QueryRecorder {
    events: Arc<dyn EventStore>,
    blocks: Arc<dyn BlockStore>,
    evaluator: RuleEvaluator,
    retry: RetryPolicy,
}

impl QueryRecorder {
    pub fn new(
        events: Arc<dyn EventStore>,
        blocks: Arc<dyn BlockStore>,
        evaluator: RuleEvaluator,
    ) -> Self {
        Self {
            events,
            blocks,
            evaluator,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn evaluator(&self) -> &RuleEvaluator {
        &self.evaluator
    }

    pub fn events(&self) -> &Arc<dyn EventStore> {
        &self.events
    }

    pub fn blocks(&self) -> &Arc<dyn BlockStore> {
        &self.blocks
    }

    /// Persist one query event
    pub async fn append(&self, event: &QueryEvent) -> Result<(), RecorderError> {
        self.retry
            .run("append", || self.events.append(event))
            .await
            .map_err(|e| {
                tracing::error!(
                    phone_number = %event.phone_number,
                    error = %e,
                    "Failed to append query event"
                );
                RecorderError::AppendFailed(e)
            })?;

        tracing::info!(
            phone_number = %event.phone_number,
            national_id = %event.national_id,
            timestamp = %event.timestamp,
            "Query registered"
        );
        Ok(())
    }

    /// Evaluate the rule over the stored history, as of `now`
    pub async fn evaluate(
        &self,
        phone_number: &str,
        now: DateTime<Utc>,
    ) -> Result<Evaluation, RecorderError> {
        let since = now - self.evaluator.config().longest_period();
        let history = self
            .retry
            .run("events_since", || self.events.events_since(phone_number, since))
            .await
            .map_err(|e| {
                tracing::error!(phone_number, error = %e, "Failed to read query history");
                RecorderError::HistoryUnavailable(e)
            })?;

        let evaluation = self.evaluator.evaluate(&history, now);
        for window in &evaluation.windows {
            tracing::debug!(
                phone_number,
                period = %window.period,
                since = %window.since,
                distinct = window.distinct_national_id_count,
                threshold = window.threshold,
                "Window evaluated"
            );
        }

        if let Some(window) = evaluation.tripped_window() {
            tracing::warn!(
                phone_number,
                period = %window.period,
                distinct = window.distinct_national_id_count,
                threshold = window.threshold,
                "Distinct national ID limit reached"
            );
        }

        Ok(evaluation)
    }

    /// Write the automatic block entry for a tripped evaluation
    pub async fn promote(
        &self,
        phone_number: &str,
        evaluation: &Evaluation,
        now: DateTime<Utc>,
    ) -> Result<Option<BlockOutcome>, RecorderError> {
        let Some(reason) = evaluation.block_reason() else {
            return Ok(None);
        };

        let entry = BlockEntry::automatic(phone_number, reason, now);
        let outcome = self
            .retry
            .run("block_if_absent", || self.blocks.block_if_absent(&entry))
            .await
            .map_err(|e| {
                tracing::error!(phone_number, error = %e, "Failed to write block entry");
                RecorderError::BlockWriteFailed(e)
            })?;

        match outcome {
            BlockOutcome::Inserted => {
                tracing::info!(phone_number, reason = %entry.reason, "Phone number blocked");
            }
            BlockOutcome::AlreadyBlocked => {
                tracing::info!(phone_number, "Phone number already blocked");
            }
        }

        Ok(Some(outcome))
    }

    /// Evaluate and, on `Block`, promote. Safe to repeat.
    pub async fn evaluate_and_promote(
        &self,
        phone_number: &str,
        now: DateTime<Utc>,
    ) -> Result<Verdict, RecorderError> {
        let evaluation = self.evaluate(phone_number, now).await?;
        self.promote(phone_number, &evaluation, now).await?;
        Ok(evaluation.verdict)
    }

    /// Append a query at `at`, then evaluate as of `at`.
    ///
    /// If the append fails nothing else runs and the error is
    /// [`RecorderError::AppendFailed`].
    pub async fn record(
        &self,
        phone_number: &str,
        national_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Verdict, RecorderError> {
        let event = QueryEvent::new(phone_number, national_id, at);
        self.append(&event).await?;
        self.evaluate_and_promote(phone_number, at).await
    }
}
