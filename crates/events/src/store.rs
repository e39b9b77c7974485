//! Event store contract

use async_trait::async_trait;
use callguard_core::{QueryEvent, StoreResult};
use chrono::{DateTime, Utc};

/// Append-only log of query events, range-scannable by phone number.
///
/// Implementations must be safe for unsynchronized concurrent use from many
/// request tasks. Failures are reported, never retried internally.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Durably persist one event. Must not drop or coalesce events.
    async fn append(&self, event: &QueryEvent) -> StoreResult<()>;

    /// Every event for `phone_number` with `timestamp >= since`, in no
    /// particular order.
    async fn events_since(
        &self,
        phone_number: &str,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<QueryEvent>>;
}
