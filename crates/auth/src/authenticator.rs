//! Authenticator (C5): Bearer/X-API-Key extraction, constant-time key match.

use std::sync::Arc;

use arc_swap::ArcSwap;
use config::AuthConfig;
use http::HeaderMap;
use jiff::Timestamp;
use subtle::ConstantTimeEq;

use crate::{error::AuthError, principal::Principal};

/// Authenticates requests against a hot-reloadable set of API keys.
pub struct Authenticator {
    config: ArcSwap<AuthConfig>,
}

impl Authenticator {
    /// Creates an authenticator over the given key set.
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config: ArcSwap::new(Arc::new(config)),
        }
    }

    /// Atomically replaces the key set, e.g. after a hot-reload tick.
    pub fn set_config(&self, config: AuthConfig) {
        self.config.store(Arc::new(config));
    }

    /// Extracts and verifies credentials from `headers`.
    ///
    /// Header precedence is `Authorization: Bearer …` then `X-API-Key`.
    /// Every configured key is compared in constant time, and the full list
    /// is scanned even once a match has been found, so a timing observer
    /// cannot distinguish "matched key 1 of 50" from "matched key 50 of 50".
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Principal, AuthError> {
        let candidate = extract_candidate(headers).ok_or(AuthError::Missing)?;
        let config = self.config.load();

        let mut matched = None;

        for key in &config.keys {
            let is_match: bool = candidate.as_bytes().ct_eq(key.key.as_bytes()).into();

            if is_match && matched.is_none() {
                matched = Some(key);
            }
        }

        let key = matched.ok_or(AuthError::Invalid)?;

        if let Some(expires_at) = key.expires_at {
            if Timestamp::now() > expires_at {
                return Err(AuthError::Expired);
            }
        }

        Ok(Principal {
            key_id: key.key_id.clone(),
            scopes: key.scopes.clone(),
            expires_at: key.expires_at,
        })
    }
}

fn extract_candidate(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get(http::header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        if let Some(token) = value.strip_prefix("Bearer ") {
            return Some(token.to_string());
        }
    }

    headers.get("x-api-key").and_then(|v| v.to_str().ok()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use config::ApiKeyConfig;

    use super::*;

    fn config_with_keys(keys: Vec<ApiKeyConfig>) -> AuthConfig {
        AuthConfig {
            keys,
            reload_interval: std::time::Duration::from_secs(5),
        }
    }

    fn key(key_id: &str, key: &str, expires_at: Option<Timestamp>) -> ApiKeyConfig {
        ApiKeyConfig {
            key_id: key_id.to_string(),
            key: key.to_string(),
            scopes: Default::default(),
            expires_at,
        }
    }

    #[test]
    fn missing_header_is_missing() {
        let auth = Authenticator::new(config_with_keys(vec![]));
        assert_eq!(auth.authenticate(&HeaderMap::new()), Err(AuthError::Missing));
    }

    #[test]
    fn bearer_precedes_api_key_header() {
        let auth = Authenticator::new(config_with_keys(vec![key("k1", "sk_live_bearer", None)]));

        let mut headers = HeaderMap::new();
        headers.insert(http::header::AUTHORIZATION, "Bearer sk_live_bearer".parse().unwrap());
        headers.insert("x-api-key", "sk_live_other".parse().unwrap());

        let principal = auth.authenticate(&headers).unwrap();
        assert_eq!(principal.key_id, "k1");
    }

    #[test]
    fn unmatched_key_is_invalid() {
        let auth = Authenticator::new(config_with_keys(vec![key("k1", "sk_live_abc", None)]));

        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", "sk_live_wrong".parse().unwrap());

        assert_eq!(auth.authenticate(&headers), Err(AuthError::Invalid));
    }

    #[test]
    fn expired_key_is_rejected() {
        let past = "2000-01-01T00:00:00Z".parse().unwrap();
        let auth = Authenticator::new(config_with_keys(vec![key("k1", "sk_live_abc", Some(past))]));

        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", "sk_live_abc".parse().unwrap());

        assert_eq!(auth.authenticate(&headers), Err(AuthError::Expired));
    }

    #[test]
    fn hot_reload_swaps_key_set() {
        let auth = Authenticator::new(config_with_keys(vec![key("k1", "sk_live_old", None)]));

        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", "sk_live_new".parse().unwrap());
        assert_eq!(auth.authenticate(&headers), Err(AuthError::Invalid));

        auth.set_config(config_with_keys(vec![key("k2", "sk_live_new", None)]));
        assert!(auth.authenticate(&headers).is_ok());
    }
}
