//! Independent YAML loaders, one per configuration concern.
//!
//! Each loader resolves its file path from an environment variable, falling
//! back to a default path in the current directory, deserializes with
//! `deny_unknown_fields`, and validates the invariants owned by that
//! concern's module. A validation failure aborts startup (the caller
//! propagates the `anyhow::Error` out of `main`).

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::de::DeserializeOwned;

use crate::{AclConfig, AuthConfig, QuotaConfig, RateLimitConfig, ServerConfig, TlsConfig};

fn resolve_path(env_var: &str, default: &str) -> PathBuf {
    std::env::var_os(env_var).map(PathBuf::from).unwrap_or_else(|| PathBuf::from(default))
}

fn load_yaml<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;

    serde_yaml::from_str(&content).with_context(|| format!("failed to parse config file at {}", path.display()))
}

/// The path `load_auth` reads from, exposed so the hot-reload watcher can be
/// pointed at the same file.
pub fn auth_config_path() -> PathBuf {
    resolve_path("AUTH_CONFIG_PATH", "./auth.yaml")
}

/// Loads and validates the authentication config from `AUTH_CONFIG_PATH`
/// (default `./auth.yaml`).
pub fn load_auth() -> anyhow::Result<AuthConfig> {
    let path = auth_config_path();
    let config: AuthConfig = load_yaml(&path)?;
    config.validate().with_context(|| format!("invalid auth config at {}", path.display()))?;

    Ok(config)
}

/// Loads and validates the ACL config from `ACL_CONFIG_PATH` (default
/// `./acl.yaml`).
pub fn load_acl() -> anyhow::Result<AclConfig> {
    let path = resolve_path("ACL_CONFIG_PATH", "./acl.yaml");
    let config: AclConfig = load_yaml(&path)?;
    config.validate().with_context(|| format!("invalid ACL config at {}", path.display()))?;

    Ok(config)
}

/// Loads and validates the rate-limit config from
/// `LEASE_RATE_LIMIT_CONFIG_PATH` (default `./rate_limits.yaml`).
pub fn load_rate_limits() -> anyhow::Result<RateLimitConfig> {
    let path = resolve_path("LEASE_RATE_LIMIT_CONFIG_PATH", "./rate_limits.yaml");
    let config: RateLimitConfig = load_yaml(&path)?;
    config.validate().with_context(|| format!("invalid rate-limit config at {}", path.display()))?;

    Ok(config)
}

/// Loads the server config from `SERVER_CONFIG_PATH` (default
/// `./server.yaml`). Missing is not an error: the gateway falls back to
/// [`ServerConfig::default`], matching the teacher's `Args::config`.
pub fn load_server() -> anyhow::Result<ServerConfig> {
    let path = resolve_path("SERVER_CONFIG_PATH", "./server.yaml");

    if !path.exists() {
        return Ok(ServerConfig::default());
    }

    load_yaml(&path)
}

/// Loads the quota config from `QUOTA_CONFIG_PATH` (default `./quota.yaml`).
pub fn load_quota() -> anyhow::Result<QuotaConfig> {
    let path = resolve_path("QUOTA_CONFIG_PATH", "./quota.yaml");
    load_yaml(&path)
}

/// Loads the TLS config from `TLS_CONFIG_PATH` (default `./tls.yaml`). TLS
/// is optional: a missing file means the gateway serves plaintext HTTP.
pub fn load_tls() -> anyhow::Result<Option<TlsConfig>> {
    let path = resolve_path("TLS_CONFIG_PATH", "./tls.yaml");

    if !path.exists() {
        return Ok(None);
    }

    load_yaml(&path).map(Some)
}
