//! Error types for rate limiting.

use std::time::Duration;

/// Errors that can occur during rate limiting.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    /// The request exceeded its token bucket's capacity.
    #[error("rate limit exceeded")]
    Throttled {
        /// Time to wait before retrying.
        retry_after: Duration,
    },
}

impl RateLimitError {
    /// The retry-after duration for this error.
    pub fn retry_after(&self) -> Duration {
        match self {
            Self::Throttled { retry_after } => *retry_after,
        }
    }
}
