//! The dead-letter-queue storage port.

use jiff::Timestamp;
use serde::Serialize;

use crate::error::StorageError;

/// A frozen snapshot of a request that could not be delivered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DlqEntry {
    /// Autoincrement id, assigned on insert.
    pub id: i64,
    /// The original request's HTTP method.
    pub method: String,
    /// The original request's target URL.
    pub url: String,
    /// The original request's headers, as a JSON-encoded object.
    pub headers: String,
    /// The original request's body.
    pub body: Vec<u8>,
    /// The last status code returned by the downstream, if any.
    pub status_code: Option<u16>,
    /// Number of delivery attempts made so far.
    pub retries: u32,
    /// The last error encountered, if any.
    pub last_error: Option<String>,
    /// When this entry was enqueued.
    pub created_at: Timestamp,
    /// When the last delivery attempt was made.
    pub last_attempt: Option<Timestamp>,
}

/// A new entry to enqueue. `id`/`retries`/`created_at`/`last_attempt` are
/// assigned by the store.
#[derive(Debug, Clone)]
pub struct NewDlqEntry {
    /// The original request's HTTP method.
    pub method: String,
    /// The original request's target URL.
    pub url: String,
    /// The original request's headers, as a JSON-encoded object.
    pub headers: String,
    /// The original request's body.
    pub body: Vec<u8>,
    /// The last status code returned by the downstream, if any.
    pub status_code: Option<u16>,
    /// The last error encountered, if any.
    pub last_error: Option<String>,
}

/// Storage port for the dead-letter queue.
#[allow(async_fn_in_trait)]
pub trait DlqStorage: Send + Sync {
    /// Enqueues a new entry, returning its assigned id.
    async fn enqueue(&self, entry: NewDlqEntry, now: Timestamp) -> Result<i64, StorageError>;

    /// Fetches a single entry by id.
    async fn get(&self, id: i64) -> Result<Option<DlqEntry>, StorageError>;

    /// Lists entries ordered by `created_at`, newest first.
    async fn list(&self, limit: u32, offset: u32) -> Result<(Vec<DlqEntry>, u64), StorageError>;

    /// Deletes an entry, e.g. after a successful replay or an operator action.
    async fn delete(&self, id: i64) -> Result<(), StorageError>;

    /// Records a replay attempt's outcome against an existing entry.
    async fn record_attempt(&self, id: i64, status_code: Option<u16>, last_error: Option<String>, now: Timestamp) -> Result<(), StorageError>;
}
