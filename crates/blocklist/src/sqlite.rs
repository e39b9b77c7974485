//! SQLite block store
//!
//! `blocked_phone_numbers` is keyed by phone number. The conditional insert
//! is a single `INSERT ... ON CONFLICT DO NOTHING` statement, so the database
//! decides the race; `rows_affected()` tells the caller whether it won.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use callguard_core::{BlockEntry, BlockOutcome, BlockSource, StoreError, StoreResult};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::error::ErrorKind;
use sqlx::{Row, SqlitePool};

use crate::store::BlockStore;

const MAX_CONNECTIONS: u32 = 8;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Block list backed by SQLite
#[derive(Clone)]
pub struct SqliteBlockStore {
    pool: SqlitePool,
}

/// Constraint and decode failures are permanent; everything else
/// (pool timeout, I/O, busy database) may succeed on retry.
fn store_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if !matches!(db.kind(), ErrorKind::Other) => {
            StoreError::Invalid(err.to_string())
        }
        sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::TypeNotFound { .. } => StoreError::Invalid(err.to_string()),
        _ => StoreError::Unavailable(err.to_string()),
    }
}

impl SqliteBlockStore {
    /// Open (or create) the database file and initialize the schema
    pub async fn open(db_path: impl AsRef<Path>) -> StoreResult<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .map_err(store_error)?;

        let store = Self::new(pool);
        store.init().await?;
        tracing::debug!(path = %db_path.display(), "Block list database ready");
        Ok(store)
    }

    /// Wrap an existing pool. Call [`SqliteBlockStore::init`] before use.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the schema
    pub async fn init(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS blocked_phone_numbers (
                phone_number TEXT PRIMARY KEY,
                reason TEXT NOT NULL,
                blocked_at TEXT NOT NULL,
                source TEXT NOT NULL,
                agent_id TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(())
    }

    /// Number of blocked phone numbers
    pub async fn count(&self) -> StoreResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM blocked_phone_numbers")
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;
        row.try_get("n").map_err(store_error)
    }
}

fn entry_from_row(row: &SqliteRow) -> StoreResult<BlockEntry> {
    let blocked_at: String = row.try_get("blocked_at").map_err(store_error)?;
    let blocked_at = DateTime::parse_from_rfc3339(&blocked_at)
        .map_err(|e| StoreError::Invalid(format!("invalid blocked_at: {}", e)))?
        .with_timezone(&Utc);

    let source: String = row.try_get("source").map_err(store_error)?;
    let source = BlockSource::from_code(&source)
        .ok_or_else(|| StoreError::Invalid(format!("invalid block source: {}", source)))?;

    Ok(BlockEntry {
        phone_number: row.try_get("phone_number").map_err(store_error)?,
        reason: row.try_get("reason").map_err(store_error)?,
        blocked_at,
        source,
        agent_id: row.try_get("agent_id").map_err(store_error)?,
    })
}

#[async_trait]
impl BlockStore for SqliteBlockStore {
    async fn is_blocked(&self, phone_number: &str) -> StoreResult<bool> {
        let row = sqlx::query("SELECT 1 FROM blocked_phone_numbers WHERE phone_number = ?")
            .bind(phone_number)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(row.is_some())
    }

    async fn block_if_absent(&self, entry: &BlockEntry) -> StoreResult<BlockOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO blocked_phone_numbers (phone_number, reason, blocked_at, source, agent_id)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(phone_number) DO NOTHING
            "#,
        )
        .bind(&entry.phone_number)
        .bind(&entry.reason)
        .bind(entry.blocked_at.to_rfc3339())
        .bind(entry.source.code())
        .bind(&entry.agent_id)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        if result.rows_affected() == 1 {
            Ok(BlockOutcome::Inserted)
        } else {
            Ok(BlockOutcome::AlreadyBlocked)
        }
    }

    async fn get(&self, phone_number: &str) -> StoreResult<Option<BlockEntry>> {
        let row = sqlx::query(
            r#"
            SELECT phone_number, reason, blocked_at, source, agent_id
            FROM blocked_phone_numbers
            WHERE phone_number = ?
            "#,
        )
        .bind(phone_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        row.as_ref().map(entry_from_row).transpose()
    }
}
