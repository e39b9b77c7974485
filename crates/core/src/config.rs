//! Rule configuration
//!
//! Thresholds and window lengths are inputs, never hardcoded in the
//! evaluator. Defaults match the deployed service.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ConfigError;

/// Trailing window over which distinct national IDs are counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Day,
    Week,
    Month,
}

impl Period {
    /// Longest first; this is the evaluation order
    pub const ALL: [Period; 3] = [Period::Month, Period::Week, Period::Day];

    pub fn name(&self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Thresholds for the distinct-national-ID rule
///
/// Immutable for the lifetime of a process. Periods are signed so that a
/// negative value in a config file is rejected by [`RuleConfig::validate`]
/// instead of failing to parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Distinct national IDs per window that trips the rule (inclusive)
    #[serde(default = "default_unique_national_id_limit")]
    pub unique_national_id_limit: i64,

    /// Day window length, in days
    #[serde(default = "default_day_period")]
    pub day_period: i64,

    /// Week window length, in days
    #[serde(default = "default_week_period")]
    pub week_period: i64,

    /// Month window length, in days
    #[serde(default = "default_month_period")]
    pub month_period: i64,
}

/// Widest window accepted by [`RuleConfig::validate`] (100 years), so that
/// `now - period` always stays inside the representable date range
pub const MAX_PERIOD_DAYS: i64 = 36_500;

fn default_unique_national_id_limit() -> i64 {
    3
}

fn default_day_period() -> i64 {
    1
}

fn default_week_period() -> i64 {
    7
}

fn default_month_period() -> i64 {
    30
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            unique_national_id_limit: default_unique_national_id_limit(),
            day_period: default_day_period(),
            week_period: default_week_period(),
            month_period: default_month_period(),
        }
    }
}

impl RuleConfig {
    /// Build and validate a config
    pub fn new(
        unique_national_id_limit: i64,
        day_period: i64,
        week_period: i64,
        month_period: i64,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            unique_national_id_limit,
            day_period,
            week_period,
            month_period,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject a limit below 1 or any period outside `1..=MAX_PERIOD_DAYS`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.unique_national_id_limit < 1 {
            return Err(ConfigError::InvalidThreshold(format!(
                "unique_national_id_limit must be >= 1, got {}",
                self.unique_national_id_limit
            )));
        }

        for period in Period::ALL {
            let days = self.period_days(period);
            if days <= 0 {
                return Err(ConfigError::InvalidThreshold(format!(
                    "{}_period must be > 0 days, got {}",
                    period, days
                )));
            }
            if days > MAX_PERIOD_DAYS {
                return Err(ConfigError::InvalidThreshold(format!(
                    "{}_period must be <= {} days, got {}",
                    period, MAX_PERIOD_DAYS, days
                )));
            }
        }

        Ok(())
    }

    /// Configured length of a window, in days
    pub fn period_days(&self, period: Period) -> i64 {
        match period {
            Period::Day => self.day_period,
            Period::Week => self.week_period,
            Period::Month => self.month_period,
        }
    }

    /// Configured length of a window
    pub fn period_duration(&self, period: Period) -> Duration {
        Duration::days(self.period_days(period))
    }

    /// The widest window; history older than this never affects a verdict
    pub fn longest_period(&self) -> Duration {
        Period::ALL
            .iter()
            .map(|p| self.period_duration(*p))
            .max()
            .unwrap_or_else(Duration::zero)
    }
}
