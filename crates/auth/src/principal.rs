//! The authenticated caller.

use std::collections::BTreeSet;

use jiff::Timestamp;

/// The caller a request authenticated as. Never carries the key secret —
/// once matched, the secret is not re-exposed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Opaque, stable identifier for the matched key.
    pub key_id: String,
    /// Scopes granted to this key.
    pub scopes: BTreeSet<String>,
    /// Optional expiry, already checked as of the authentication call.
    pub expires_at: Option<Timestamp>,
}

impl Principal {
    /// Whether this principal carries `scope`.
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }
}
