//! Persistent dedup store keyed by reply-to address.
//!
//! Backed by SQLite. The pool holds a single connection, so every
//! [`DedupStore::try_insert`] is serialized, and the insert itself is a single
//! `INSERT ... ON CONFLICT DO NOTHING` statement.

use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tracing::info;

use crate::headers::HeaderList;
use crate::{Error, Result};

/// Record persisted for the first event seen from a reply-to address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupRecord {
    pub to: String,
    pub from: String,
    pub headers: HeaderList,
}

/// Result of [`DedupStore::try_insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyExists,
}

/// Handle to the dedup store. Cheap to clone.
#[derive(Clone)]
pub struct DedupStore {
    pool: SqlitePool,
}

impl DedupStore {
    /// Open the store at `path`, creating the file and schema if missing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreUnavailable`] if the database cannot be opened or
    /// initialized.
    pub async fn open(path: &str) -> Result<Self> {
        let url = format!("sqlite:{path}?mode=rwc");
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&url)
            .await
            .map_err(Error::StoreUnavailable)?;

        let store = Self { pool };
        store.initialize().await.map_err(Error::StoreUnavailable)?;
        info!(path = %path, "dedup_store_opened");
        Ok(store)
    }

    /// Create an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreUnavailable`] if the database cannot be created.
    pub async fn in_memory() -> Result<Self> {
        // The database lives only as long as its connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(Error::StoreUnavailable)?;

        let store = Self { pool };
        store.initialize().await.map_err(Error::StoreUnavailable)?;
        Ok(store)
    }

    async fn initialize(&self) -> std::result::Result<(), sqlx::Error> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS replies (
                reply_to TEXT PRIMARY KEY NOT NULL,
                record TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Record `key` unless it is already present.
    ///
    /// Atomic with respect to concurrent callers: for any key exactly one call
    /// ever returns [`InsertOutcome::Inserted`].
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be serialized or the query fails.
    pub async fn try_insert(&self, key: &str, record: &DedupRecord) -> Result<InsertOutcome> {
        let body = serde_json::to_string(record)?;

        let result = sqlx::query(
            r"
            INSERT INTO replies (reply_to, record)
            VALUES (?, ?)
            ON CONFLICT(reply_to) DO NOTHING
            ",
        )
        .bind(key)
        .bind(&body)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            Ok(InsertOutcome::Inserted)
        } else {
            Ok(InsertOutcome::AlreadyExists)
        }
    }

    /// Fetch the record stored for `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored record is corrupt.
    pub async fn get(&self, key: &str) -> Result<Option<DedupRecord>> {
        let row = sqlx::query("SELECT record FROM replies WHERE reply_to = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let body: String = row.get("record");
                Ok(Some(serde_json::from_str(&body)?))
            }
            None => Ok(None),
        }
    }

    /// Check whether `key` has been recorded.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn contains(&self, key: &str) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM replies WHERE reply_to = ?")
            .bind(key)
            .fetch_one(&self.pool)
            .await?;

        let count: i64 = row.get("count");
        Ok(count > 0)
    }

    /// Number of recorded reply-to addresses.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn len(&self) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM replies")
            .fetch_one(&self.pool)
            .await?;

        let count: i64 = row.get("count");
        Ok(count.max(0) as u64)
    }

    /// Close the underlying pool.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("dedup_store_closed");
    }
}
