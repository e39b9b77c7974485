//! CallGuard core domain types
//!
//! Shared vocabulary for the abuse-detection gate:
//!
//! - [`QueryEvent`] - one recorded query (phone number + national ID + time)
//! - [`BlockEntry`] - one row of the persistent block list
//! - [`RuleConfig`] - thresholds and window lengths, validated at startup
//! - [`StoreError`] - failure taxonomy shared by every store implementation

pub mod block;
pub mod config;
pub mod error;
pub mod event;
pub mod normalize;

pub use block::{BlockEntry, BlockOutcome, BlockSource, AUTOMATIC_AGENT_ID};
pub use config::{Period, RuleConfig, MAX_PERIOD_DAYS};
pub use error::{ConfigError, StoreError, StoreResult};
pub use event::QueryEvent;
pub use normalize::{normalize_national_id, normalize_phone_number};
