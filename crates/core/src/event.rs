//! Query events - the immutable input of rule evaluation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single query made by a phone number for a national ID.
///
/// Events are written once and never mutated or deleted by CallGuard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryEvent {
    /// Caller phone number (E.164)
    pub phone_number: String,
    /// Identity token submitted with the query; not validated here
    pub national_id: String,
    /// When the query happened
    pub timestamp: DateTime<Utc>,
}

impl QueryEvent {
    /// Create a new query event
    pub fn new(
        phone_number: impl Into<String>,
        national_id: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            phone_number: phone_number.into(),
            national_id: national_id.into(),
            timestamp,
        }
    }

    /// True if this event happened at or after `since`
    pub fn is_since(&self, since: DateTime<Utc>) -> bool {
        self.timestamp >= since
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_is_since_is_inclusive() {
        let now = Utc::now();
        let event = QueryEvent::new("+56900000001", "A", now);

        assert!(event.is_since(now));
        assert!(event.is_since(now - Duration::seconds(1)));
        assert!(!event.is_since(now + Duration::seconds(1)));
    }

    #[test]
    fn test_event_json_shape() {
        let event = QueryEvent::new("+56900000001", "111111111", Utc::now());
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["phone_number"], "+56900000001");
        assert_eq!(json["national_id"], "111111111");
        assert!(json["timestamp"].is_string());
    }
}
