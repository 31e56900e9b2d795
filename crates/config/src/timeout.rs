//! Per-lease request-deadline configuration (C7).

use std::time::Duration;

use serde::Deserialize;

/// Timeout tuning, nested under `server.yaml`'s `timeout` key.
///
/// The source this gateway is modeled on derives a deadline from a
/// lease-specific override, else a service-type override, else a default;
/// "service-type" isn't part of this gateway's data model (leases carry no
/// such field), so only the two-tier lease-override-or-default resolution is
/// implemented here.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimeoutConfig {
    /// Deadline applied when no per-lease rule matches, in milliseconds.
    pub default_ms: u64,
    /// Per-lease overrides, in file order (wildcard tie-breaking uses this order).
    pub leases: Vec<LeaseTimeoutRule>,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { default_ms: 30_000, leases: Vec::new() }
    }
}

/// A per-lease deadline override.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LeaseTimeoutRule {
    /// Exact lease id, or a trailing-`*` prefix pattern (same grammar as ACL).
    pub lease_id_pattern: String,
    /// The deadline for leases matching this pattern, in milliseconds.
    pub deadline_ms: u64,
}

impl LeaseTimeoutRule {
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

impl TimeoutConfig {
    /// Validates every lease rule's wildcard grammar.
    pub fn validate(&self) -> Result<(), crate::acl::PatternError> {
        for rule in &self.leases {
            rule.validate()?;
        }

        Ok(())
    }

    /// Resolves the deadline for `lease_id`: exact match wins; otherwise the
    /// wildcard rule with the longest literal prefix that is a prefix of
    /// `lease_id`; otherwise the default.
    pub fn deadline_for(&self, lease_id: &str) -> Duration {
        let ms = self
            .leases
            .iter()
            .find(|r| !r.is_wildcard() && r.lease_id_pattern == lease_id)
            .or_else(|| {
                self.leases
                    .iter()
                    .filter(|r| r.is_wildcard() && lease_id.starts_with(r.literal_prefix()))
                    .max_by_key(|r| r.literal_prefix().len())
            })
            .map(|r| r.deadline_ms)
            .unwrap_or(self.default_ms);

        Duration::from_millis(ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_default_when_no_rule_matches() {
        let config = TimeoutConfig::default();
        assert_eq!(config.deadline_for("anything"), Duration::from_millis(30_000));
    }

    #[test]
    fn exact_rule_wins_over_wildcard() {
        let config = TimeoutConfig {
            default_ms: 1000,
            leases: vec![
                LeaseTimeoutRule { lease_id_pattern: "svc-*".into(), deadline_ms: 2000 },
                LeaseTimeoutRule { lease_id_pattern: "svc-a".into(), deadline_ms: 3000 },
            ],
        };

        assert_eq!(config.deadline_for("svc-a"), Duration::from_millis(3000));
        assert_eq!(config.deadline_for("svc-b"), Duration::from_millis(2000));
    }
}
