//! Sample data for local and staging deployments

use callguard_core::{BlockEntry, BlockOutcome, QueryEvent, StoreResult};
use chrono::{DateTime, Duration, Utc};

use crate::state::Stores;

pub const SAMPLE_PHONE_NUMBERS: [&str; 5] = [
    "+56911111111",
    "+56922222222",
    "+56933333333",
    "+56944444444",
    "+56955555555",
];

/// Already normalized
pub const SAMPLE_NATIONAL_IDS: [&str; 7] = [
    "111111111",
    "222222222",
    "333333333",
    "444444444",
    "555555555",
    "666666666",
    "777777777",
];

const SEED_AGENT: &str = "Conversational Agent";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub blocks_inserted: usize,
    pub blocks_existing: usize,
    pub queries_written: usize,
}

/// Block the first two sample numbers manually and spread `queries` events
/// over the last 30 days. Events are written straight to the store, so no
/// rule evaluation runs.
pub async fn seed(stores: &Stores, queries: usize, now: DateTime<Utc>) -> StoreResult<SeedReport> {
    let mut report = SeedReport::default();

    let manual_blocks = [
        (SAMPLE_PHONE_NUMBERS[0], "Reported by customer for fraudulent call"),
        (SAMPLE_PHONE_NUMBERS[1], "Suspicious activity detected."),
    ];
    for (phone_number, reason) in manual_blocks {
        let entry = BlockEntry::manual(phone_number, reason, SEED_AGENT, now);
        match stores.blocks.block_if_absent(&entry).await? {
            BlockOutcome::Inserted => report.blocks_inserted += 1,
            BlockOutcome::AlreadyBlocked => report.blocks_existing += 1,
        }
    }

    for i in 0..queries {
        let phone_number = SAMPLE_PHONE_NUMBERS[i % SAMPLE_PHONE_NUMBERS.len()];
        let national_id = SAMPLE_NATIONAL_IDS[(i * 3) % SAMPLE_NATIONAL_IDS.len()];
        let age = Duration::days((i % 31) as i64) + Duration::hours(((i * 5) % 24) as i64);

        stores
            .events
            .append(&QueryEvent::new(phone_number, national_id, now - age))
            .await?;
        report.queries_written += 1;
    }

    tracing::info!(
        blocks_inserted = report.blocks_inserted,
        blocks_existing = report.blocks_existing,
        queries_written = report.queries_written,
        "Seed data written"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use callguard_core::BlockSource;

    #[tokio::test]
    async fn test_seed_blocks_first_numbers() {
        let stores = Stores::memory();
        let now = Utc::now();

        let report = seed(&stores, 20, now).await.unwrap();
        assert_eq!(report.blocks_inserted, 2);
        assert_eq!(report.queries_written, 20);

        let entry = stores.blocks.get("+56911111111").await.unwrap().unwrap();
        assert_eq!(entry.source, BlockSource::Manual);
        assert_eq!(entry.agent_id, SEED_AGENT);
        assert!(!stores.blocks.is_blocked("+56933333333").await.unwrap());

        let history = stores
            .events
            .events_since("+56933333333", now - Duration::days(31))
            .await
            .unwrap();
        assert_eq!(history.len(), 4);
    }

    #[tokio::test]
    async fn test_seed_twice_keeps_blocks() {
        let stores = Stores::memory();

        seed(&stores, 0, Utc::now()).await.unwrap();
        let report = seed(&stores, 0, Utc::now()).await.unwrap();

        assert_eq!(report.blocks_inserted, 0);
        assert_eq!(report.blocks_existing, 2);
    }
}
