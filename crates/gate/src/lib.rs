//! CallGuard Fraud Gate
//!
//! ```text
//!  check request                 record request
//!       │                              │
//!       ▼                              ▼
//! ┌──────────────┐              ┌──────────────┐
//! │ FraudGate    │              │ FraudGate    │
//! │ check        │              │ submit_query │──► append event (bounded retries)
//! └──────┬───────┘              └──────┬───────┘
//!        │ is_blocked                  │ enqueue job, acknowledge
//!        ▼                             ▼
//!   Block Store ◄──────────────  EvaluationWorker
//!                block_if_absent   └─► QueryRecorder: history ─► RuleEvaluator
//! ```
//!
//! The check path never touches the event store. The record path returns as
//! soon as the event is durable; evaluation and the block write happen on
//! the worker and affect later checks only.

pub mod config;
pub mod decision;
pub mod error;
pub mod gate;
pub mod recorder;
pub mod retry;
pub mod worker;

pub use config::{FailPolicy, GateConfig, RecorderConfig};
pub use decision::Decision;
pub use error::{GateError, RecorderError};
pub use gate::{Acknowledgement, FraudGate};
pub use recorder::QueryRecorder;
pub use retry::RetryPolicy;
pub use worker::{EvaluationJob, EvaluationWorker, WorkerHandle};
