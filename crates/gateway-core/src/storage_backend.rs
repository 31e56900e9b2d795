//! Picks between the in-memory and SQLite storage backends at startup.
//!
//! `quota::QuotaManager` and the DLQ admin handlers are generic over the
//! storage port traits, but those traits use `async fn` in their
//! definition and so aren't object-safe — there's no `Box<dyn QuotaStorage>`.
//! This enum is the alternative: a closed set of concrete backends,
//! delegated to by a match in every trait method.

use jiff::Timestamp;
use storage::{DlqEntry, DlqStorage, InMemoryDlqStorage, InMemoryQuotaStorage, NewDlqEntry, QuotaStorage, QuotaUsage, SqliteStorage, StorageError};

/// The concrete storage backend selected by `quota.yaml`'s `storage` block.
pub enum AnyStorage {
    /// Non-durable, in-process storage.
    Memory(InMemoryQuotaStorage, InMemoryDlqStorage),
    /// SQLite-backed durable storage.
    Sqlite(SqliteStorage),
}

impl QuotaStorage for AnyStorage {
    async fn get_usage(&self, key_id: &str) -> Result<Option<QuotaUsage>, StorageError> {
        match self {
            Self::Memory(quota, _) => quota.get_usage(key_id).await,
            Self::Sqlite(storage) => storage.get_usage(key_id).await,
        }
    }

    async fn update_usage(
        &self,
        key_id: &str,
        delta_requests: u64,
        delta_bytes: u64,
        current_period_start: Timestamp,
        now: Timestamp,
    ) -> Result<QuotaUsage, StorageError> {
        match self {
            Self::Memory(quota, _) => quota.update_usage(key_id, delta_requests, delta_bytes, current_period_start, now).await,
            Self::Sqlite(storage) => storage.update_usage(key_id, delta_requests, delta_bytes, current_period_start, now).await,
        }
    }

    async fn reset_usage(&self, key_id: &str, current_period_start: Timestamp, now: Timestamp) -> Result<(), StorageError> {
        match self {
            Self::Memory(quota, _) => quota.reset_usage(key_id, current_period_start, now).await,
            Self::Sqlite(storage) => storage.reset_usage(key_id, current_period_start, now).await,
        }
    }

    async fn list_usage(&self) -> Result<Vec<QuotaUsage>, StorageError> {
        match self {
            Self::Memory(quota, _) => quota.list_usage().await,
            Self::Sqlite(storage) => storage.list_usage().await,
        }
    }

    async fn close(&self) -> Result<(), StorageError> {
        match self {
            Self::Memory(quota, _) => quota.close().await,
            Self::Sqlite(storage) => storage.close().await,
        }
    }
}

impl DlqStorage for AnyStorage {
    async fn enqueue(&self, entry: NewDlqEntry, now: Timestamp) -> Result<i64, StorageError> {
        match self {
            Self::Memory(_, dlq) => dlq.enqueue(entry, now).await,
            Self::Sqlite(storage) => storage.enqueue(entry, now).await,
        }
    }

    async fn get(&self, id: i64) -> Result<Option<DlqEntry>, StorageError> {
        match self {
            Self::Memory(_, dlq) => dlq.get(id).await,
            Self::Sqlite(storage) => storage.get(id).await,
        }
    }

    async fn list(&self, limit: u32, offset: u32) -> Result<(Vec<DlqEntry>, u64), StorageError> {
        match self {
            Self::Memory(_, dlq) => dlq.list(limit, offset).await,
            Self::Sqlite(storage) => storage.list(limit, offset).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<(), StorageError> {
        match self {
            Self::Memory(_, dlq) => dlq.delete(id).await,
            Self::Sqlite(storage) => storage.delete(id).await,
        }
    }

    async fn record_attempt(&self, id: i64, status_code: Option<u16>, last_error: Option<String>, now: Timestamp) -> Result<(), StorageError> {
        match self {
            Self::Memory(_, dlq) => dlq.record_attempt(id, status_code, last_error, now).await,
            Self::Sqlite(storage) => storage.record_attempt(id, status_code, last_error, now).await,
        }
    }
}

impl AnyStorage {
    /// Builds the configured backend.
    pub async fn connect(config: &config::QuotaStorageConfig) -> anyhow::Result<Self> {
        match config {
            config::QuotaStorageConfig::Memory => Ok(Self::Memory(InMemoryQuotaStorage::new(), InMemoryDlqStorage::new())),
            config::QuotaStorageConfig::Sqlite { path } => {
                let path = path.to_str().ok_or_else(|| anyhow::anyhow!("quota storage path is not valid UTF-8: {}", path.display()))?;
                Ok(Self::Sqlite(SqliteStorage::connect(path).await?))
            }
        }
    }
}
