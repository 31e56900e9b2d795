//! Storage ports for quota usage and the dead-letter queue, plus an
//! in-memory implementation (tests, non-durable deployments) and a SQLite
//! implementation.

#![deny(missing_docs)]

mod dlq;
mod error;
mod memory;
mod sqlite;
mod usage;

pub use dlq::{DlqEntry, DlqStorage, NewDlqEntry};
pub use error::StorageError;
pub use memory::{InMemoryDlqStorage, InMemoryQuotaStorage};
pub use sqlite::SqliteStorage;
pub use usage::{QuotaStorage, QuotaUsage};
