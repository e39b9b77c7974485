//! Evaluation results

use callguard_core::Period;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of rule evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Allow,
    Block,
}

impl Verdict {
    pub fn is_block(&self) -> bool {
        matches!(self, Verdict::Block)
    }
}

/// Distinct-ID count for one trailing window. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationWindow {
    pub period: Period,
    pub period_days: i64,
    /// Start of the window (inclusive)
    pub since: DateTime<Utc>,
    pub distinct_national_id_count: usize,
    pub threshold: i64,
}

impl EvaluationWindow {
    /// The limit is inclusive: reaching it trips the rule
    pub fn is_tripped(&self) -> bool {
        self.distinct_national_id_count as i64 >= self.threshold
    }
}

/// Full evaluation report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub verdict: Verdict,
    /// One entry per window, longest first
    pub windows: Vec<EvaluationWindow>,
}

impl Evaluation {
    /// First tripped window in evaluation order
    pub fn tripped_window(&self) -> Option<&EvaluationWindow> {
        self.windows.iter().find(|w| w.is_tripped())
    }

    /// Reason recorded on an automatic block
    pub fn block_reason(&self) -> Option<String> {
        self.tripped_window()
            .map(|w| format!("Automatic block (rule: {} period)", w.period))
    }
}
