//! SQLite-backed implementation of the quota and DLQ storage ports.

use jiff::Timestamp;
use sqlx::{Row, SqlitePool, sqlite::SqlitePoolOptions};
use tokio::sync::Mutex;

use crate::{
    dlq::{DlqEntry, DlqStorage, NewDlqEntry},
    error::StorageError,
    usage::{QuotaStorage, QuotaUsage},
};

/// A SQLite-backed store for quota usage and DLQ entries. Timestamps are
/// stored as epoch-second integers; this crate owns no `chrono` dependency.
pub struct SqliteStorage {
    pool: SqlitePool,
    /// Serializes `update_usage`'s read-modify-write against the
    /// `quota_usage` row, since it spans a `SELECT` and a separate
    /// `INSERT ... ON CONFLICT` with no database-side transaction tying
    /// them together.
    usage_write_lock: Mutex<()>,
}

impl SqliteStorage {
    /// Opens (creating if absent) the SQLite database at `path` and runs
    /// migrations.
    pub async fn connect(path: &str) -> Result<Self, StorageError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&format!("sqlite://{path}?mode=rwc"))
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await.map_err(|err| StorageError::Database(err.into()))?;

        Ok(Self { pool, usage_write_lock: Mutex::new(()) })
    }

    fn row_to_usage(row: &sqlx::sqlite::SqliteRow) -> Result<QuotaUsage, StorageError> {
        Ok(QuotaUsage {
            key_id: row.try_get("key_id")?,
            request_count: row.try_get::<i64, _>("request_count")? as u64,
            bytes_transferred: row.try_get::<i64, _>("bytes_transferred")? as u64,
            last_request_time: row
                .try_get::<Option<i64>, _>("last_request_time")?
                .map(Timestamp::from_second)
                .transpose()
                .map_err(|err| StorageError::Database(sqlx::Error::Decode(Box::new(err))))?,
            period_start: Timestamp::from_second(row.try_get::<i64, _>("period_start")?)
                .map_err(|err| StorageError::Database(sqlx::Error::Decode(Box::new(err))))?,
            updated_at: Timestamp::from_second(row.try_get::<i64, _>("updated_at")?)
                .map_err(|err| StorageError::Database(sqlx::Error::Decode(Box::new(err))))?,
        })
    }

    fn row_to_dlq_entry(row: &sqlx::sqlite::SqliteRow) -> Result<DlqEntry, StorageError> {
        Ok(DlqEntry {
            id: row.try_get("id")?,
            method: row.try_get("method")?,
            url: row.try_get("url")?,
            headers: row.try_get("headers")?,
            body: row.try_get("body")?,
            status_code: row.try_get::<Option<i64>, _>("status_code")?.map(|v| v as u16),
            retries: row.try_get::<i64, _>("retries")? as u32,
            last_error: row.try_get("last_error")?,
            created_at: Timestamp::from_second(row.try_get::<i64, _>("created_at")?)
                .map_err(|err| StorageError::Database(sqlx::Error::Decode(Box::new(err))))?,
            last_attempt: row
                .try_get::<Option<i64>, _>("last_attempt")?
                .map(Timestamp::from_second)
                .transpose()
                .map_err(|err| StorageError::Database(sqlx::Error::Decode(Box::new(err))))?,
        })
    }
}

impl QuotaStorage for SqliteStorage {
    async fn get_usage(&self, key_id: &str) -> Result<Option<QuotaUsage>, StorageError> {
        let row = sqlx::query("SELECT * FROM quota_usage WHERE key_id = ?")
            .bind(key_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_usage).transpose()
    }

    async fn update_usage(
        &self,
        key_id: &str,
        delta_requests: u64,
        delta_bytes: u64,
        current_period_start: Timestamp,
        now: Timestamp,
    ) -> Result<QuotaUsage, StorageError> {
        let _guard = self.usage_write_lock.lock().await;

        let existing = self.get_usage(key_id).await?;

        let (request_count, bytes_transferred) = match &existing {
            Some(row) if row.period_start == current_period_start => {
                (row.request_count + delta_requests, row.bytes_transferred + delta_bytes)
            }
            _ => (delta_requests, delta_bytes),
        };

        sqlx::query(
            "INSERT INTO quota_usage (key_id, request_count, bytes_transferred, last_request_time, period_start, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(key_id) DO UPDATE SET
                request_count = excluded.request_count,
                bytes_transferred = excluded.bytes_transferred,
                last_request_time = excluded.last_request_time,
                period_start = excluded.period_start,
                updated_at = excluded.updated_at",
        )
        .bind(key_id)
        .bind(request_count as i64)
        .bind(bytes_transferred as i64)
        .bind(now.as_second())
        .bind(current_period_start.as_second())
        .bind(now.as_second())
        .execute(&self.pool)
        .await?;

        Ok(QuotaUsage {
            key_id: key_id.to_string(),
            request_count,
            bytes_transferred,
            last_request_time: Some(now),
            period_start: current_period_start,
            updated_at: now,
        })
    }

    async fn reset_usage(&self, key_id: &str, current_period_start: Timestamp, now: Timestamp) -> Result<(), StorageError> {
        let _guard = self.usage_write_lock.lock().await;

        sqlx::query(
            "INSERT INTO quota_usage (key_id, request_count, bytes_transferred, last_request_time, period_start, updated_at)
             VALUES (?, 0, 0, NULL, ?, ?)
             ON CONFLICT(key_id) DO UPDATE SET
                request_count = 0, bytes_transferred = 0, last_request_time = NULL,
                period_start = excluded.period_start, updated_at = excluded.updated_at",
        )
        .bind(key_id)
        .bind(current_period_start.as_second())
        .bind(now.as_second())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_usage(&self) -> Result<Vec<QuotaUsage>, StorageError> {
        let rows = sqlx::query("SELECT * FROM quota_usage").fetch_all(&self.pool).await?;
        rows.iter().map(Self::row_to_usage).collect()
    }

    async fn close(&self) -> Result<(), StorageError> {
        self.pool.close().await;
        Ok(())
    }
}

impl DlqStorage for SqliteStorage {
    async fn enqueue(&self, entry: NewDlqEntry, now: Timestamp) -> Result<i64, StorageError> {
        let result = sqlx::query(
            "INSERT INTO dlq_entries (method, url, headers, body, status_code, retries, last_error, created_at, last_attempt)
             VALUES (?, ?, ?, ?, ?, 0, ?, ?, NULL)",
        )
        .bind(entry.method)
        .bind(entry.url)
        .bind(entry.headers)
        .bind(entry.body)
        .bind(entry.status_code.map(|v| v as i64))
        .bind(entry.last_error)
        .bind(now.as_second())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn get(&self, id: i64) -> Result<Option<DlqEntry>, StorageError> {
        let row = sqlx::query("SELECT * FROM dlq_entries WHERE id = ?").bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(Self::row_to_dlq_entry).transpose()
    }

    async fn list(&self, limit: u32, offset: u32) -> Result<(Vec<DlqEntry>, u64), StorageError> {
        let total: i64 = sqlx::query("SELECT COUNT(*) AS count FROM dlq_entries")
            .fetch_one(&self.pool)
            .await?
            .try_get("count")?;

        let rows = sqlx::query("SELECT * FROM dlq_entries ORDER BY created_at DESC LIMIT ? OFFSET ?")
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await?;

        let entries = rows.iter().map(Self::row_to_dlq_entry).collect::<Result<Vec<_>, _>>()?;

        Ok((entries, total as u64))
    }

    async fn delete(&self, id: i64) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM dlq_entries WHERE id = ?").bind(id).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }

    async fn record_attempt(&self, id: i64, status_code: Option<u16>, last_error: Option<String>, now: Timestamp) -> Result<(), StorageError> {
        let result = sqlx::query(
            "UPDATE dlq_entries SET retries = retries + 1, status_code = ?, last_error = ?, last_attempt = ? WHERE id = ?",
        )
        .bind(status_code.map(|v| v as i64))
        .bind(last_error)
        .bind(now.as_second())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }
}
