//! The quota manager: per-key monthly caps plus in-process connection counting.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, RwLock};

use config::{QuotaConfig, QuotaLimit};
use jiff::Timestamp;
use storage::QuotaStorage;

use crate::error::QuotaError;
use crate::period;
use crate::status::QuotaStatus;

/// Composes the configured per-key limits, a durable usage store, and an
/// in-memory table of live connection counts.
///
/// Live connection counts are never persisted — they reset to zero on
/// restart, same as any other in-process gauge.
pub struct QuotaManager<S> {
    config: QuotaConfig,
    overrides: RwLock<BTreeMap<String, QuotaLimit>>,
    storage: S,
    connections: Mutex<HashMap<String, u32>>,
}

impl<S: QuotaStorage> QuotaManager<S> {
    /// Builds a manager over the given config and storage backend.
    pub fn new(config: QuotaConfig, storage: S) -> Self {
        Self { config, overrides: RwLock::new(BTreeMap::new()), storage, connections: Mutex::new(HashMap::new()) }
    }

    /// The underlying storage backend, e.g. for a caller that also needs
    /// the dead-letter-queue port the same backend implements.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn limit_for(&self, key_id: &str) -> QuotaLimit {
        if let Some(limit) = self.overrides.read().expect("quota overrides lock poisoned").get(key_id) {
            return *limit;
        }

        *self.config.limit_for(key_id)
    }

    /// The effective limit for `key_id`: its override if present, else the
    /// configured default.
    pub fn limit(&self, key_id: &str) -> QuotaLimit {
        self.limit_for(key_id)
    }

    /// Replaces the effective limit for `key_id`, as an admin action. Takes
    /// precedence over both the configured default and any `keys` override
    /// loaded at startup.
    pub fn set_limit(&self, key_id: &str, limit: QuotaLimit) {
        self.overrides.write().expect("quota overrides lock poisoned").insert(key_id.to_string(), limit);
    }

    /// Checks whether `key_id` has room for a request of `estimated_bytes`
    /// without exceeding its monthly request or byte cap. Does not record
    /// the request — call [`record`](Self::record) once it completes.
    pub async fn check(&self, key_id: &str, estimated_bytes: u64) -> Result<(), QuotaError> {
        let limit = self.limit_for(key_id);
        let now = Timestamp::now();
        let current_period = period::current_period_start(now);

        let (count, bytes) = match self.storage.get_usage(key_id).await? {
            Some(row) if row.period_start == current_period => (row.request_count, row.bytes_transferred),
            _ => (0, 0),
        };

        if limit.monthly_request_cap != 0 && count >= limit.monthly_request_cap {
            return Err(QuotaError::RequestCapExceeded);
        }
        if limit.monthly_bytes_cap != 0 && bytes.saturating_add(estimated_bytes) > limit.monthly_bytes_cap {
            return Err(QuotaError::ByteCapExceeded);
        }
        Ok(())
    }

    /// Records one completed request of `actual_bytes` against `key_id`'s
    /// usage, rolling over to a fresh period if the stored usage predates
    /// the current calendar month.
    pub async fn record(&self, key_id: &str, actual_bytes: u64) -> Result<(), QuotaError> {
        let now = Timestamp::now();
        let current_period = period::current_period_start(now);
        self.storage.update_usage(key_id, 1, actual_bytes, current_period, now).await?;
        Ok(())
    }

    /// Claims one connection slot for `key_id`, failing if its concurrent
    /// connection cap is already saturated.
    pub fn acquire_connection(&self, key_id: &str) -> Result<(), QuotaError> {
        let limit = self.limit_for(key_id);
        let mut connections = self.connections.lock().expect("connections mutex poisoned");
        let current = connections.get(key_id).copied().unwrap_or(0);

        if limit.concurrent_connection_cap != 0 && current >= limit.concurrent_connection_cap {
            return Err(QuotaError::ConnectionCapExceeded);
        }
        connections.insert(key_id.to_string(), current + 1);
        Ok(())
    }

    /// Releases one connection slot previously claimed for `key_id`.
    pub fn release_connection(&self, key_id: &str) {
        let mut connections = self.connections.lock().expect("connections mutex poisoned");
        if let Some(current) = connections.get_mut(key_id) {
            *current = current.saturating_sub(1);
            if *current == 0 {
                connections.remove(key_id);
            }
        }
    }

    /// Returns a point-in-time usage snapshot for `key_id`.
    pub async fn status(&self, key_id: &str) -> Result<QuotaStatus, QuotaError> {
        let limit = self.limit_for(key_id);
        let now = Timestamp::now();
        let current_period = period::current_period_start(now);

        let (count, bytes) = match self.storage.get_usage(key_id).await? {
            Some(row) if row.period_start == current_period => (row.request_count, row.bytes_transferred),
            _ => (0, 0),
        };

        let connections_in_use = {
            let connections = self.connections.lock().expect("connections mutex poisoned");
            connections.get(key_id).copied().unwrap_or(0)
        };

        let requests_remaining =
            (limit.monthly_request_cap != 0).then(|| limit.monthly_request_cap.saturating_sub(count));
        let bytes_remaining =
            (limit.monthly_bytes_cap != 0).then(|| limit.monthly_bytes_cap.saturating_sub(bytes));
        let connections_remaining = (limit.concurrent_connection_cap != 0)
            .then(|| limit.concurrent_connection_cap.saturating_sub(connections_in_use));

        let exceeded_reason = if requests_remaining == Some(0) {
            Some("monthly request cap exceeded".to_string())
        } else if bytes_remaining == Some(0) {
            Some("monthly byte cap exceeded".to_string())
        } else if connections_remaining == Some(0) {
            Some("concurrent connection cap exceeded".to_string())
        } else {
            None
        };

        Ok(QuotaStatus {
            key_id: key_id.to_string(),
            requests_remaining,
            bytes_remaining,
            connections_remaining,
            period_end: period::period_end(current_period),
            exceeded_reason,
        })
    }

    /// Resets `key_id`'s durable usage. Live connection counts are
    /// untouched — they track connections that are actually open.
    pub async fn reset(&self, key_id: &str) -> Result<(), QuotaError> {
        let now = Timestamp::now();
        let current_period = period::current_period_start(now);
        self.storage.reset_usage(key_id, current_period, now).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::QuotaStorageConfig;
    use std::collections::BTreeMap;
    use storage::InMemoryQuotaStorage;

    fn config_with_default(limit: QuotaLimit) -> QuotaConfig {
        QuotaConfig { default: limit, storage: QuotaStorageConfig::Memory, keys: BTreeMap::new() }
    }

    #[tokio::test]
    async fn check_allows_requests_under_cap() {
        let manager =
            QuotaManager::new(config_with_default(QuotaLimit { monthly_request_cap: 2, ..Default::default() }), InMemoryQuotaStorage::new());

        assert!(manager.check("k1", 0).await.is_ok());
        manager.record("k1", 0).await.unwrap();
        assert!(manager.check("k1", 0).await.is_ok());
    }

    #[tokio::test]
    async fn check_rejects_once_request_cap_reached() {
        let manager =
            QuotaManager::new(config_with_default(QuotaLimit { monthly_request_cap: 1, ..Default::default() }), InMemoryQuotaStorage::new());

        manager.record("k1", 0).await.unwrap();
        assert!(matches!(manager.check("k1", 0).await, Err(QuotaError::RequestCapExceeded)));
    }

    #[tokio::test]
    async fn check_rejects_once_byte_cap_would_be_exceeded() {
        let manager =
            QuotaManager::new(config_with_default(QuotaLimit { monthly_bytes_cap: 100, ..Default::default() }), InMemoryQuotaStorage::new());

        manager.record("k1", 90).await.unwrap();
        assert!(matches!(manager.check("k1", 20).await, Err(QuotaError::ByteCapExceeded)));
        assert!(manager.check("k1", 10).await.is_ok());
    }

    #[test]
    fn connection_cap_is_enforced_and_released() {
        let manager =
            QuotaManager::new(config_with_default(QuotaLimit { concurrent_connection_cap: 1, ..Default::default() }), InMemoryQuotaStorage::new());

        manager.acquire_connection("k1").unwrap();
        assert!(matches!(manager.acquire_connection("k1"), Err(QuotaError::ConnectionCapExceeded)));

        manager.release_connection("k1");
        assert!(manager.acquire_connection("k1").is_ok());
    }

    #[tokio::test]
    async fn status_reports_remaining_and_exceeded_reason() {
        let manager =
            QuotaManager::new(config_with_default(QuotaLimit { monthly_request_cap: 1, ..Default::default() }), InMemoryQuotaStorage::new());

        manager.record("k1", 0).await.unwrap();
        let status = manager.status("k1").await.unwrap();

        assert_eq!(status.requests_remaining, Some(0));
        assert_eq!(status.exceeded_reason.as_deref(), Some("monthly request cap exceeded"));
    }

    #[tokio::test]
    async fn reset_clears_durable_usage() {
        let manager =
            QuotaManager::new(config_with_default(QuotaLimit { monthly_request_cap: 1, ..Default::default() }), InMemoryQuotaStorage::new());

        manager.record("k1", 0).await.unwrap();
        manager.reset("k1").await.unwrap();
        assert!(manager.check("k1", 0).await.is_ok());
    }
}
