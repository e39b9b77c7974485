//! Gate and recorder configuration

use std::time::Duration;

use callguard_core::ConfigError;
use serde::{Deserialize, Serialize};

use crate::decision::Decision;

/// What the check path answers when the block store cannot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailPolicy {
    /// Treat the number as blocked (DEFAULT)
    #[default]
    FailClosed,

    /// Let the call through
    FailOpen,
}

impl FailPolicy {
    /// Decision to use when status is unknown
    pub fn resolve(&self) -> Decision {
        match self {
            FailPolicy::FailClosed => Decision::Blocked,
            FailPolicy::FailOpen => Decision::Allowed,
        }
    }
}

/// Check path and background queue settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateConfig {
    /// Timeout for a block list lookup
    #[serde(default = "default_check_timeout_ms")]
    pub check_timeout_ms: u64,

    #[serde(default)]
    pub fail_policy: FailPolicy,

    /// Evaluation jobs waiting for the worker
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Evaluations running at once
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
}

fn default_check_timeout_ms() -> u64 {
    500
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_max_in_flight() -> usize {
    64
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            check_timeout_ms: default_check_timeout_ms(),
            fail_policy: FailPolicy::default(),
            queue_capacity: default_queue_capacity(),
            max_in_flight: default_max_in_flight(),
        }
    }
}

impl GateConfig {
    pub fn check_timeout(&self) -> Duration {
        Duration::from_millis(self.check_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.check_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "gate.check_timeout_ms must be >= 1".to_string(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "gate.queue_capacity must be >= 1".to_string(),
            ));
        }
        if self.max_in_flight == 0 {
            return Err(ConfigError::InvalidValue(
                "gate.max_in_flight must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Retry settings for store calls made by the recorder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecorderConfig {
    /// Total attempts per store call, first try included
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff unit; attempt `n` waits `n * retry_backoff_ms` before retrying
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    50
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl RecorderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "recorder.max_attempts must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}
