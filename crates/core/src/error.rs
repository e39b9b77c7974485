//! Core errors

use thiserror::Error;

/// Failure reported by an Event Store or Block Store.
///
/// Stores never retry internally; retry policy belongs to the recorder.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Timeout, connection loss, I/O failure. The caller may retry.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A conditional write lost a race. Block stores resolve this into
    /// `BlockOutcome::AlreadyBlocked`; it should not reach callers.
    #[error("store conflict: {0}")]
    Conflict(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The store rejected the data or holds data it cannot read back
    /// (constraint violation, undecodable column). Retrying cannot help.
    #[error("invalid stored data: {0}")]
    Invalid(String),
}

impl StoreError {
    /// True if retrying the same operation may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Invalid configuration; fatal at startup
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid threshold: {0}")]
    InvalidThreshold(String),

    #[error("invalid value: {0}")]
    InvalidValue(String),
}
