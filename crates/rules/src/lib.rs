//! CallGuard Rule Evaluator
//!
//! Pure decision function over a phone number's query history:
//!
//! ```text
//! history ──► for each window (month, week, day)
//!               since = now - period_days
//!               distinct national IDs with timestamp >= since
//!               tripped if distinct >= limit
//!          ──► Block if any window tripped, else Allow
//! ```
//!
//! No I/O, no clock: `now` is an input, so evaluation is deterministic and
//! can be repeated freely.

pub mod evaluator;
pub mod verdict;

pub use evaluator::{evaluate, RuleEvaluator};
pub use verdict::{Evaluation, EvaluationWindow, Verdict};
