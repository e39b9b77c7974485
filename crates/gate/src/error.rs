//! Recorder and gate errors

use callguard_core::StoreError;
use thiserror::Error;

/// Failure while recording a query and evaluating its history
#[derive(Debug, Error)]
pub enum RecorderError {
    /// Nothing was recorded. Never acknowledge the query in this case.
    #[error("failed to append query event: {0}")]
    AppendFailed(#[source] StoreError),

    /// The event is durable but the history could not be read
    #[error("failed to read query history: {0}")]
    HistoryUnavailable(#[source] StoreError),

    /// The event is durable and the rule tripped, but the block write failed
    #[error("failed to write block entry: {0}")]
    BlockWriteFailed(#[source] StoreError),
}

impl RecorderError {
    /// True if the query event itself was persisted
    pub fn event_recorded(&self) -> bool {
        !matches!(self, RecorderError::AppendFailed(_))
    }
}

/// Failure surfaced by the gate to the webhook layer
#[derive(Debug, Error)]
pub enum GateError {
    #[error("query not recorded: {0}")]
    Recording(#[from] RecorderError),

    /// The block store could not answer in time. The caller applies its
    /// fail policy.
    #[error("unable to determine block status: {0}")]
    StatusUnknown(String),
}

/// Result type for gate operations
pub type GateResult<T> = Result<T, GateError>;
