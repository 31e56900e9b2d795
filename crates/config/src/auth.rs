//! API key authentication configuration.

use std::collections::BTreeSet;

use jiff::Timestamp;
use serde::Deserialize;

/// The two accepted API key prefixes. A loader rejects any key that does not
/// start with one of these.
pub const KEY_PREFIXES: [&str; 2] = ["sk_live_", "sk_test_"];

/// Top-level authentication configuration: the list of API keys the gateway
/// accepts, loaded from `AUTH_CONFIG_PATH` (default `./auth.yaml`).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// The configured API keys.
    pub keys: Vec<ApiKeyConfig>,
    /// How often the file-watch loop polls this file's mtime for changes.
    #[serde(default = "default_reload_interval", deserialize_with = "duration_str::deserialize_duration")]
    pub reload_interval: std::time::Duration,
}

fn default_reload_interval() -> std::time::Duration {
    std::time::Duration::from_secs(5)
}

/// A single API key entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiKeyConfig {
    /// Opaque, stable identifier for this key. Never re-derived from the secret.
    pub key_id: String,
    /// The secret value presented by clients, e.g. `sk_live_abc123`.
    pub key: String,
    /// Scopes granted to this key.
    #[serde(default)]
    pub scopes: BTreeSet<String>,
    /// Optional RFC3339 expiry. A key is expired strictly after this instant.
    #[serde(default)]
    pub expires_at: Option<Timestamp>,
}

impl ApiKeyConfig {
    /// Validates the key format invariant from §4.5: the secret must start with
    /// one of [`KEY_PREFIXES`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if KEY_PREFIXES.iter().any(|prefix| self.key.starts_with(prefix)) {
            Ok(())
        } else {
            Err(ConfigError::InvalidKeyFormat { key_id: self.key_id.clone() })
        }
    }
}

/// Errors raised while validating authentication configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A configured key does not start with `sk_live_` or `sk_test_`.
    #[error("API key '{key_id}' does not use a recognized prefix (sk_live_ or sk_test_)")]
    InvalidKeyFormat {
        /// The offending key's id.
        key_id: String,
    },
}

impl AuthConfig {
    /// Validates every configured key, aborting (per §7's `invalid_key_format`
    /// startup-abort policy) at the first offender.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for key in &self.keys {
            key.validate()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_prefix() {
        let key = ApiKeyConfig {
            key_id: "k1".into(),
            key: "plain-secret".into(),
            scopes: BTreeSet::new(),
            expires_at: None,
        };

        assert!(key.validate().is_err());
    }

    #[test]
    fn accepts_live_and_test_prefixes() {
        for prefix in KEY_PREFIXES {
            let key = ApiKeyConfig {
                key_id: "k1".into(),
                key: format!("{prefix}abc"),
                scopes: BTreeSet::new(),
                expires_at: None,
            };

            assert!(key.validate().is_ok());
        }
    }
}
