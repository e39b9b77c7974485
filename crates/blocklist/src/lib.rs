//! CallGuard Block List
//!
//! Key-value set of blocked phone numbers. The one property everything else
//! relies on: [`BlockStore::block_if_absent`] is an atomic conditional insert.
//! Two evaluations racing to block the same number produce exactly one
//! write; the loser sees [`BlockOutcome::AlreadyBlocked`], not an error.
//!
//! [`BlockOutcome::AlreadyBlocked`]: callguard_core::BlockOutcome::AlreadyBlocked

pub mod memory;
pub mod sqlite;
pub mod store;

pub use memory::MemoryBlockStore;
pub use sqlite::SqliteBlockStore;
pub use store::BlockStore;
