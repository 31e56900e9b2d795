//! In-memory storage backends, used by tests and non-durable deployments.

use std::collections::HashMap;

use jiff::Timestamp;
use tokio::sync::Mutex;

use crate::{
    dlq::{DlqEntry, DlqStorage, NewDlqEntry},
    error::StorageError,
    usage::{QuotaStorage, QuotaUsage},
};

/// In-memory [`QuotaStorage`]. Counters are lost on restart.
#[derive(Default)]
pub struct InMemoryQuotaStorage {
    rows: Mutex<HashMap<String, QuotaUsage>>,
}

impl InMemoryQuotaStorage {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl QuotaStorage for InMemoryQuotaStorage {
    async fn get_usage(&self, key_id: &str) -> Result<Option<QuotaUsage>, StorageError> {
        Ok(self.rows.lock().await.get(key_id).cloned())
    }

    async fn update_usage(
        &self,
        key_id: &str,
        delta_requests: u64,
        delta_bytes: u64,
        current_period_start: Timestamp,
        now: Timestamp,
    ) -> Result<QuotaUsage, StorageError> {
        let mut rows = self.rows.lock().await;

        let row = rows
            .entry(key_id.to_string())
            .and_modify(|row| {
                if row.period_start != current_period_start {
                    row.period_start = current_period_start;
                    row.request_count = 0;
                    row.bytes_transferred = 0;
                }

                row.request_count += delta_requests;
                row.bytes_transferred += delta_bytes;
                row.last_request_time = Some(now);
                row.updated_at = now;
            })
            .or_insert_with(|| QuotaUsage {
                key_id: key_id.to_string(),
                request_count: delta_requests,
                bytes_transferred: delta_bytes,
                last_request_time: Some(now),
                period_start: current_period_start,
                updated_at: now,
            });

        Ok(row.clone())
    }

    async fn reset_usage(&self, key_id: &str, current_period_start: Timestamp, now: Timestamp) -> Result<(), StorageError> {
        let mut rows = self.rows.lock().await;

        rows.insert(
            key_id.to_string(),
            QuotaUsage {
                key_id: key_id.to_string(),
                request_count: 0,
                bytes_transferred: 0,
                last_request_time: None,
                period_start: current_period_start,
                updated_at: now,
            },
        );

        Ok(())
    }

    async fn list_usage(&self) -> Result<Vec<QuotaUsage>, StorageError> {
        Ok(self.rows.lock().await.values().cloned().collect())
    }

    async fn close(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// In-memory [`DlqStorage`]. Entries are lost on restart.
#[derive(Default)]
pub struct InMemoryDlqStorage {
    rows: Mutex<HashMap<i64, DlqEntry>>,
    next_id: Mutex<i64>,
}

impl InMemoryDlqStorage {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl DlqStorage for InMemoryDlqStorage {
    async fn enqueue(&self, entry: NewDlqEntry, now: Timestamp) -> Result<i64, StorageError> {
        let mut next_id = self.next_id.lock().await;
        *next_id += 1;
        let id = *next_id;

        self.rows.lock().await.insert(
            id,
            DlqEntry {
                id,
                method: entry.method,
                url: entry.url,
                headers: entry.headers,
                body: entry.body,
                status_code: entry.status_code,
                retries: 0,
                last_error: entry.last_error,
                created_at: now,
                last_attempt: None,
            },
        );

        Ok(id)
    }

    async fn get(&self, id: i64) -> Result<Option<DlqEntry>, StorageError> {
        Ok(self.rows.lock().await.get(&id).cloned())
    }

    async fn list(&self, limit: u32, offset: u32) -> Result<(Vec<DlqEntry>, u64), StorageError> {
        let rows = self.rows.lock().await;
        let mut entries: Vec<_> = rows.values().cloned().collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = entries.len() as u64;
        let page = entries.into_iter().skip(offset as usize).take(limit as usize).collect();

        Ok((page, total))
    }

    async fn delete(&self, id: i64) -> Result<(), StorageError> {
        self.rows.lock().await.remove(&id).ok_or(StorageError::NotFound)?;
        Ok(())
    }

    async fn record_attempt(&self, id: i64, status_code: Option<u16>, last_error: Option<String>, now: Timestamp) -> Result<(), StorageError> {
        let mut rows = self.rows.lock().await;
        let entry = rows.get_mut(&id).ok_or(StorageError::NotFound)?;

        entry.retries += 1;
        entry.status_code = status_code;
        entry.last_error = last_error;
        entry.last_attempt = Some(now);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(seconds: i64) -> Timestamp {
        Timestamp::from_second(seconds).unwrap()
    }

    #[tokio::test]
    async fn update_usage_accumulates_within_period() {
        let storage = InMemoryQuotaStorage::new();
        let period = ts(1_000_000);

        storage.update_usage("k1", 1, 100, period, ts(1_000_001)).await.unwrap();
        let row = storage.update_usage("k1", 2, 200, period, ts(1_000_002)).await.unwrap();

        assert_eq!(row.request_count, 3);
        assert_eq!(row.bytes_transferred, 300);
    }

    #[tokio::test]
    async fn update_usage_rolls_over_on_new_period() {
        let storage = InMemoryQuotaStorage::new();
        let period1 = ts(1_000_000);
        let period2 = ts(2_000_000);

        storage.update_usage("k1", 5, 500, period1, ts(1_000_001)).await.unwrap();
        let row = storage.update_usage("k1", 1, 10, period2, ts(2_000_001)).await.unwrap();

        assert_eq!(row.request_count, 1);
        assert_eq!(row.bytes_transferred, 10);
        assert_eq!(row.period_start, period2);
    }

    #[tokio::test]
    async fn dlq_enqueue_list_delete_roundtrip() {
        let storage = InMemoryDlqStorage::new();

        let id = storage
            .enqueue(
                NewDlqEntry {
                    method: "POST".into(),
                    url: "https://example.test/x".into(),
                    headers: "{}".into(),
                    body: vec![1, 2, 3],
                    status_code: Some(502),
                    last_error: Some("connection reset".into()),
                },
                ts(100),
            )
            .await
            .unwrap();

        let (entries, total) = storage.list(10, 0).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(entries[0].id, id);

        storage.delete(id).await.unwrap();
        assert!(storage.get(id).await.unwrap().is_none());
    }
}
