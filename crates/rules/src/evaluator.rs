//! Distinct national ID rule

use std::collections::HashSet;

use callguard_core::{Period, QueryEvent, RuleConfig};
use chrono::{DateTime, Utc};

use crate::verdict::{Evaluation, EvaluationWindow, Verdict};

/// Evaluate one phone number's history against `config` at `now`.
///
/// `history` is treated as a set of events for a single phone number. Blank
/// or malformed national IDs still count as distinct values.
pub fn evaluate(history: &[QueryEvent], config: &RuleConfig, now: DateTime<Utc>) -> Evaluation {
    let windows: Vec<EvaluationWindow> = Period::ALL
        .iter()
        .map(|&period| window(history, config, period, now))
        .collect();

    let verdict = if windows.iter().any(EvaluationWindow::is_tripped) {
        Verdict::Block
    } else {
        Verdict::Allow
    };

    Evaluation { verdict, windows }
}

fn window(
    history: &[QueryEvent],
    config: &RuleConfig,
    period: Period,
    now: DateTime<Utc>,
) -> EvaluationWindow {
    let since = now - config.period_duration(period);

    let distinct: HashSet<&str> = history
        .iter()
        .filter(|e| e.is_since(since))
        .map(|e| e.national_id.as_str())
        .collect();

    EvaluationWindow {
        period,
        period_days: config.period_days(period),
        since,
        distinct_national_id_count: distinct.len(),
        threshold: config.unique_national_id_limit,
    }
}

/// Evaluator bound to a validated [`RuleConfig`]
#[derive(Debug, Clone)]
pub struct RuleEvaluator {
    config: RuleConfig,
}

impl RuleEvaluator {
    pub fn new(config: RuleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RuleConfig {
        &self.config
    }

    pub fn evaluate(&self, history: &[QueryEvent], now: DateTime<Utc>) -> Evaluation {
        evaluate(history, &self.config, now)
    }
}
