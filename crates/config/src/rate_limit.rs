//! Per-lease rate-limit configuration.

use serde::Deserialize;

/// Top-level rate-limit configuration, loaded from the rate-limits YAML file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RateLimitConfig {
    /// The `(rate, burst)` pair applied when no per-lease rule matches.
    pub default: RateLimitQuota,
    /// Per-lease overrides, in file order (wildcard tie-breaking uses this order).
    pub leases: Vec<LeaseRateLimitRule>,
    /// How often the background sweep drops idle buckets from the cache.
    pub cleanup_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            default: RateLimitQuota::default(),
            leases: Vec::new(),
            cleanup_interval_secs: 300,
        }
    }
}

/// A `(rate, burst)` pair.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitQuota {
    /// Sustained requests-per-second rate.
    pub rate_per_second: f64,
    /// Maximum burst size (bucket capacity).
    pub burst: u32,
}

impl Default for RateLimitQuota {
    fn default() -> Self {
        Self {
            rate_per_second: 10.0,
            burst: 20,
        }
    }
}

/// A per-lease rate-limit override.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LeaseRateLimitRule {
    /// Exact lease id, or a trailing-`*` prefix pattern (same grammar as ACL).
    pub lease_id_pattern: String,
    /// The rate/burst pair for leases matching this pattern.
    #[serde(flatten)]
    pub quota: RateLimitQuota,
}

impl LeaseRateLimitRule {
    /// The literal prefix of a wildcard pattern, or the whole pattern if exact.
    pub fn literal_prefix(&self) -> &str {
        self.lease_id_pattern.strip_suffix('*').unwrap_or(&self.lease_id_pattern)
    }

    /// Whether this rule's pattern is a trailing-wildcard pattern.
    pub fn is_wildcard(&self) -> bool {
        self.lease_id_pattern.ends_with('*')
    }

    /// Validates this rule's pattern grammar.
    pub fn validate(&self) -> Result<(), crate::acl::PatternError> {
        crate::acl::validate_pattern(&self.lease_id_pattern)
    }
}

impl RateLimitConfig {
    /// Validates every lease rule's wildcard grammar.
    pub fn validate(&self) -> Result<(), crate::acl::PatternError> {
        for rule in &self.leases {
            rule.validate()?;
        }

        Ok(())
    }

    /// How often the background bucket-cleanup sweep should run.
    pub fn cleanup_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.cleanup_interval_secs)
    }
}
