//! Caller-facing decision

use serde::{Deserialize, Serialize};

/// Answer of the synchronous check path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allowed,
    Blocked,
}

impl Decision {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Decision::Blocked)
    }
}

impl From<bool> for Decision {
    fn from(blocked: bool) -> Self {
        if blocked {
            Decision::Blocked
        } else {
            Decision::Allowed
        }
    }
}
