//! Quota status, as exposed to the admin surface.

use jiff::Timestamp;
use serde::Serialize;

/// A point-in-time view of a key's quota usage against its limits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuotaStatus {
    /// The key this status describes.
    pub key_id: String,
    /// Requests remaining in the current period, or `None` if uncapped.
    pub requests_remaining: Option<u64>,
    /// Bytes remaining in the current period, or `None` if uncapped.
    pub bytes_remaining: Option<u64>,
    /// Concurrent connection slots remaining, or `None` if uncapped.
    pub connections_remaining: Option<u32>,
    /// The last instant of the current period.
    pub period_end: Timestamp,
    /// A human-readable reason if the key has exceeded any cap.
    pub exceeded_reason: Option<String>,
}
