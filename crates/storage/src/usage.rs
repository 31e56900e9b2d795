//! The quota-usage storage port.

use jiff::Timestamp;

use crate::error::StorageError;

/// A key's quota usage row.
#[derive(Debug, Clone, PartialEq)]
pub struct QuotaUsage {
    /// The key this usage row belongs to.
    pub key_id: String,
    /// Requests counted in the current period.
    pub request_count: u64,
    /// Bytes transferred in the current period.
    pub bytes_transferred: u64,
    /// When the most recent request was recorded.
    pub last_request_time: Option<Timestamp>,
    /// Start of the billing period this row covers.
    pub period_start: Timestamp,
    /// When this row was last written.
    pub updated_at: Timestamp,
}

/// Storage port for quota usage counters (C3's backing store).
///
/// `update_usage` is responsible for monthly rollover: if the stored
/// `period_start` does not match `current_period_start`, the implementation
/// replaces the row with a fresh period and treats the given deltas as the
/// first increment of that new period, rather than adding onto stale counts.
#[allow(async_fn_in_trait)]
pub trait QuotaStorage: Send + Sync {
    /// Fetches the current usage row for `key_id`, if any.
    async fn get_usage(&self, key_id: &str) -> Result<Option<QuotaUsage>, StorageError>;

    /// Applies `delta_requests`/`delta_bytes` to `key_id`'s row, rolling over
    /// to a fresh period if the stored period has ended. Returns the
    /// resulting row.
    async fn update_usage(
        &self,
        key_id: &str,
        delta_requests: u64,
        delta_bytes: u64,
        current_period_start: Timestamp,
        now: Timestamp,
    ) -> Result<QuotaUsage, StorageError>;

    /// Resets `key_id`'s usage to zero for the current period.
    async fn reset_usage(&self, key_id: &str, current_period_start: Timestamp, now: Timestamp) -> Result<(), StorageError>;

    /// Lists every key's current usage row.
    async fn list_usage(&self) -> Result<Vec<QuotaUsage>, StorageError>;

    /// Releases any resources held by the backend (connection pools, etc).
    async fn close(&self) -> Result<(), StorageError>;
}
