//! Block store contract

use async_trait::async_trait;
use callguard_core::{BlockEntry, BlockOutcome, StoreResult};

/// Persistent set of blocked phone numbers
///
/// Must be safe for unsynchronized concurrent use, and must give
/// read-after-write consistency per key.
#[async_trait]
pub trait BlockStore: Send + Sync {
    /// Existence check
    async fn is_blocked(&self, phone_number: &str) -> StoreResult<bool>;

    /// Insert `entry` unless its phone number is already blocked.
    ///
    /// Never overwrites an existing entry's reason, timestamp or provenance.
    async fn block_if_absent(&self, entry: &BlockEntry) -> StoreResult<BlockOutcome>;

    /// Fetch the entry for a phone number, if any
    async fn get(&self, phone_number: &str) -> StoreResult<Option<BlockEntry>>;
}
