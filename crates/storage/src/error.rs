//! Storage port errors.

/// Errors a [`crate::QuotaStorage`] or [`crate::DlqStorage`] implementation
/// may return.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The backing SQLite store returned an error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    /// No entry exists for the given key.
    #[error("entry not found")]
    NotFound,
}
