//! Quota configuration: default caps, storage backend, and per-key overrides.

use std::{collections::BTreeMap, path::PathBuf};

use serde::{Deserialize, Serialize};

/// Top-level quota configuration, loaded from the quotas YAML file.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct QuotaConfig {
    /// Caps applied when a key has no specific override.
    pub default: QuotaLimit,
    /// Where quota usage counters are persisted.
    pub storage: QuotaStorageConfig,
    /// Per-key cap overrides, keyed by `key_id`.
    pub keys: BTreeMap<String, QuotaLimit>,
}

impl QuotaConfig {
    /// Returns the effective limit for a key: its override if present, else the default.
    pub fn limit_for(&self, key_id: &str) -> &QuotaLimit {
        self.keys.get(key_id).unwrap_or(&self.default)
    }
}

/// Per-key quota caps. A field of `0` means "unlimited" for that dimension.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuotaLimit {
    /// Maximum requests per calendar month. `0` = unlimited.
    pub monthly_request_cap: u64,
    /// Maximum bytes transferred per calendar month. `0` = unlimited.
    pub monthly_bytes_cap: u64,
    /// Maximum concurrent connections. `0` = unlimited.
    pub concurrent_connection_cap: u32,
}

impl Default for QuotaLimit {
    fn default() -> Self {
        Self {
            monthly_request_cap: 0,
            monthly_bytes_cap: 0,
            concurrent_connection_cap: 0,
        }
    }
}

/// Where quota usage is persisted.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum QuotaStorageConfig {
    /// In-memory only; counters are lost on restart. Used by tests and
    /// single-process deployments that don't need durability.
    Memory,
    /// SQLite-backed persistence at the given path.
    Sqlite {
        /// Filesystem path to the SQLite database file.
        path: PathBuf,
    },
}

impl Default for QuotaStorageConfig {
    fn default() -> Self {
        Self::Memory
    }
}
