//! Per-lease rate-limit policy (C6): resolves a lease to a `(rate, burst)`
//! pair and derives the cache key C1 indexes on.

use config::{LeaseRateLimitRule, RateLimitConfig, RateLimitQuota};

/// The principal/IP identity a request is rate-limited under, independent of
/// any lease.
pub enum Identity<'a> {
    /// An authenticated principal, identified by its key id.
    Key(&'a str),
    /// An unauthenticated request, identified by its source IP (or
    /// `"unknown"` if none could be determined).
    Ip(&'a str),
}

/// Resolves the `(rate, burst)` pair for a lease using the same
/// exact-then-longest-wildcard-prefix rule as the ACL resolver, falling back
/// to `config.default` when nothing matches.
pub fn resolve_quota(config: &RateLimitConfig, lease_id: Option<&str>) -> RateLimitQuota {
    let Some(lease_id) = lease_id else {
        return config.default;
    };

    if let Some(rule) = config.leases.iter().find(|r| !r.is_wildcard() && r.lease_id_pattern == lease_id) {
        return rule.quota;
    }

    let best: Option<&LeaseRateLimitRule> = config
        .leases
        .iter()
        .filter(|r| r.is_wildcard() && lease_id.starts_with(r.literal_prefix()))
        .max_by_key(|r| r.literal_prefix().len());

    best.map(|r| r.quota).unwrap_or(config.default)
}

/// Builds the C1 cache key: `lease:{L}:key:{K}` when a principal exists,
/// `lease:{L}:ip:{IP or "unknown"}` otherwise. When no lease is set, the
/// request is still keyed, just without a lease segment, so it falls under
/// the base policy.
pub fn cache_key(lease_id: Option<&str>, identity: &Identity<'_>) -> String {
    let identity_segment = match identity {
        Identity::Key(key_id) => format!("key:{key_id}"),
        Identity::Ip(ip) => format!("ip:{ip}"),
    };

    match lease_id {
        Some(lease_id) => format!("lease:{lease_id}:{identity_segment}"),
        None => identity_segment,
    }
}

#[cfg(test)]
mod tests {
    use config::LeaseRateLimitRule;

    use super::*;

    fn quota(rate: f64, burst: u32) -> RateLimitQuota {
        RateLimitQuota { rate_per_second: rate, burst }
    }

    fn rule(pattern: &str, rate: f64, burst: u32) -> LeaseRateLimitRule {
        LeaseRateLimitRule {
            lease_id_pattern: pattern.to_string(),
            quota: quota(rate, burst),
        }
    }

    #[test]
    fn falls_back_to_default_without_lease() {
        let config = RateLimitConfig {
            default: quota(10.0, 20),
            leases: vec![],
        };

        let resolved = resolve_quota(&config, None);
        assert_eq!(resolved.rate_per_second, 10.0);
    }

    #[test]
    fn exact_match_wins_over_wildcard() {
        let config = RateLimitConfig {
            default: quota(1.0, 1),
            leases: vec![rule("svc-*", 5.0, 5), rule("svc-a", 50.0, 50)],
        };

        let resolved = resolve_quota(&config, Some("svc-a"));
        assert_eq!(resolved.rate_per_second, 50.0);
    }

    #[test]
    fn longest_wildcard_prefix_wins() {
        let config = RateLimitConfig {
            default: quota(1.0, 1),
            leases: vec![rule("svc-*", 5.0, 5), rule("svc-prod-*", 9.0, 9)],
        };

        let resolved = resolve_quota(&config, Some("svc-prod-east"));
        assert_eq!(resolved.rate_per_second, 9.0);
    }

    #[test]
    fn cache_key_includes_lease_and_identity() {
        assert_eq!(cache_key(Some("L"), &Identity::Key("K")), "lease:L:key:K");
        assert_eq!(cache_key(Some("L"), &Identity::Ip("1.2.3.4")), "lease:L:ip:1.2.3.4");
        assert_eq!(cache_key(None, &Identity::Ip("unknown")), "ip:unknown");
    }
}
