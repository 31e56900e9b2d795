//! Authentication errors.

/// Errors produced by [`crate::Authenticator::authenticate`].
#[derive(Debug, Clone, Copy, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    /// No `Authorization: Bearer` or `X-API-Key` header was present.
    #[error("missing credentials")]
    Missing,
    /// The presented key does not match any configured key.
    #[error("invalid credentials")]
    Invalid,
    /// The presented key matched, but its `expires_at` is in the past.
    #[error("credentials expired")]
    Expired,
}
