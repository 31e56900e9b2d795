//! Quota errors.

/// Why a `check` or `acquire_connection` call was rejected, or an error
/// propagated from the backing storage port.
#[derive(Debug, thiserror::Error)]
pub enum QuotaError {
    /// The monthly request cap has been reached.
    #[error("monthly request cap exceeded")]
    RequestCapExceeded,
    /// The monthly byte cap would be exceeded by this request.
    #[error("monthly byte cap exceeded")]
    ByteCapExceeded,
    /// The concurrent connection cap has been reached.
    #[error("concurrent connection cap exceeded")]
    ConnectionCapExceeded,
    /// The storage backend failed to answer.
    #[error("quota storage error: {0}")]
    Storage(#[from] storage::StorageError),
}
