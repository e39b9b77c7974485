//! Block list entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Agent id recorded on blocks written by the rule engine
pub const AUTOMATIC_AGENT_ID: &str = "automatic_block";

/// Who created a block entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockSource {
    /// Written by the rule engine when a window tripped
    Automatic,
    /// Written by an operator
    Manual,
}

impl BlockSource {
    /// Stable storage code
    pub fn code(&self) -> &'static str {
        match self {
            BlockSource::Automatic => "automatic",
            BlockSource::Manual => "manual",
        }
    }

    /// Parse a storage code
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "automatic" => Some(BlockSource::Automatic),
            "manual" => Some(BlockSource::Manual),
            _ => None,
        }
    }
}

impl fmt::Display for BlockSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One blocked phone number.
///
/// At most one entry exists per phone number. Entries are never removed or
/// overwritten by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockEntry {
    pub phone_number: String,
    pub reason: String,
    pub blocked_at: DateTime<Utc>,
    pub source: BlockSource,
    pub agent_id: String,
}

impl BlockEntry {
    /// Entry written by the rule engine
    pub fn automatic(
        phone_number: impl Into<String>,
        reason: impl Into<String>,
        blocked_at: DateTime<Utc>,
    ) -> Self {
        Self {
            phone_number: phone_number.into(),
            reason: reason.into(),
            blocked_at,
            source: BlockSource::Automatic,
            agent_id: AUTOMATIC_AGENT_ID.to_string(),
        }
    }

    /// Entry written by an operator
    pub fn manual(
        phone_number: impl Into<String>,
        reason: impl Into<String>,
        agent_id: impl Into<String>,
        blocked_at: DateTime<Utc>,
    ) -> Self {
        Self {
            phone_number: phone_number.into(),
            reason: reason.into(),
            blocked_at,
            source: BlockSource::Manual,
            agent_id: agent_id.into(),
        }
    }
}

/// Outcome of an atomic conditional insert into the block list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockOutcome {
    /// This call created the entry
    Inserted,
    /// An entry already existed; nothing was written
    AlreadyBlocked,
}

impl BlockOutcome {
    pub fn is_inserted(&self) -> bool {
        matches!(self, BlockOutcome::Inserted)
    }
}
