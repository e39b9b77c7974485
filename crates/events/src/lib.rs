//! CallGuard Events - query event store
//!
//! The event log is the source of truth for rule evaluation: counts are
//! always derived from it, never cached.
//!
//! - [`EventStore`] - append / range-scan contract
//! - [`MemoryEventStore`] - in-process store for tests and the `memory` backend
//! - [`JournalEventStore`] - append-only JSONL journal, one file per UTC day

pub mod journal;
pub mod memory;
pub mod store;

pub use journal::JournalEventStore;
pub use memory::MemoryEventStore;
pub use store::EventStore;
