//! Access-control resolver (C4): lease → rule lookup, key and CIDR gates.

mod client_ip;

use std::net::IpAddr;

use config::AclConfig;

pub use client_ip::extract_client_ip;

/// Outcome of an ACL check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The request is allowed to reach the lease.
    Ok,
    /// No rule matches `lease_id` (fail-closed).
    LeaseNotFound,
    /// A rule matched but the key is not in `allowed_key_ids`.
    KeyNotAllowed,
    /// A rule matched and has CIDRs configured, but the client IP is not
    /// covered by any of them.
    IpNotWhitelisted,
    /// The lease id itself is malformed (e.g. empty).
    InvalidLease,
}

/// The access-control resolver: holds the current rule table and answers
/// `check` queries against it.
pub struct AclResolver {
    config: AclConfig,
}

impl AclResolver {
    /// Creates a resolver over a loaded rule table.
    pub fn new(config: AclConfig) -> Self {
        Self { config }
    }

    /// Replaces the rule table, e.g. after an admin-initiated reload.
    pub fn set_config(&mut self, config: AclConfig) {
        self.config = config;
    }

    /// Every currently configured rule, in file order.
    pub fn rules(&self) -> &[config::AclRule] {
        &self.config.rules
    }

    /// The rule with an exact pattern match for `lease_id`, if any. Unlike
    /// [`check`](Self::check), this does not fall back to a wildcard rule —
    /// the admin surface looks up rules by their literal pattern.
    pub fn rule(&self, lease_id_pattern: &str) -> Option<&config::AclRule> {
        self.config.rules.iter().find(|r| r.lease_id_pattern == lease_id_pattern)
    }

    /// Inserts `rule`, replacing any existing rule with the same pattern.
    pub fn upsert_rule(&mut self, rule: config::AclRule) {
        self.config.rules.retain(|r| r.lease_id_pattern != rule.lease_id_pattern);
        self.config.rules.push(rule);
    }

    /// Removes the rule with an exact pattern match for `lease_id_pattern`.
    /// Returns whether a rule was removed.
    pub fn remove_rule(&mut self, lease_id_pattern: &str) -> bool {
        let before = self.config.rules.len();
        self.config.rules.retain(|r| r.lease_id_pattern != lease_id_pattern);
        self.config.rules.len() != before
    }

    /// Checks whether `key_id` from `client_ip` may reach `lease_id`.
    pub fn check(&self, lease_id: &str, key_id: &str, client_ip: Option<IpAddr>) -> Outcome {
        if lease_id.is_empty() {
            return Outcome::InvalidLease;
        }

        let Some(rule) = self.resolve_rule(lease_id) else {
            return Outcome::LeaseNotFound;
        };

        if !rule.allowed_key_ids.is_empty() && !rule.allowed_key_ids.contains(key_id) {
            return Outcome::KeyNotAllowed;
        }

        if !rule.allowed_cidrs.is_empty() {
            let allowed = match client_ip {
                Some(ip) => rule.allowed_cidrs.iter().any(|cidr| cidr.contains(&ip)),
                None => false,
            };

            if !allowed {
                return Outcome::IpNotWhitelisted;
            }
        }

        Outcome::Ok
    }

    /// Resolves the rule for `lease_id`: exact match wins; otherwise the
    /// wildcard rule with the longest literal prefix that is a prefix of
    /// `lease_id`.
    fn resolve_rule(&self, lease_id: &str) -> Option<&config::AclRule> {
        if let Some(rule) = self.config.rules.iter().find(|r| !r.is_wildcard() && r.lease_id_pattern == lease_id) {
            return Some(rule);
        }

        self.config
            .rules
            .iter()
            .filter(|r| r.is_wildcard() && lease_id.starts_with(r.literal_prefix()))
            .max_by_key(|r| r.literal_prefix().len())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use config::AclRule;

    use super::*;

    fn rule(pattern: &str, keys: &[&str], cidrs: &[&str]) -> AclRule {
        AclRule {
            lease_id_pattern: pattern.to_string(),
            allowed_key_ids: keys.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
            allowed_cidrs: cidrs.iter().map(|c| c.parse().unwrap()).collect(),
        }
    }

    #[test]
    fn exact_match_shadows_wildcard() {
        let resolver = AclResolver::new(AclConfig {
            rules: vec![rule("svc-*", &["k1"], &[]), rule("svc-a", &["k2"], &[])],
        });

        assert_eq!(resolver.check("svc-a", "k2", None), Outcome::Ok);
        assert_eq!(resolver.check("svc-a", "k1", None), Outcome::KeyNotAllowed);
    }

    #[test]
    fn longest_wildcard_prefix_wins() {
        let resolver = AclResolver::new(AclConfig {
            rules: vec![rule("svc-*", &["k1"], &[]), rule("svc-prod-*", &["k2"], &[])],
        });

        assert_eq!(resolver.check("svc-prod-east", "k2", None), Outcome::Ok);
        assert_eq!(resolver.check("svc-prod-east", "k1", None), Outcome::KeyNotAllowed);
    }

    #[test]
    fn no_match_is_lease_not_found() {
        let resolver = AclResolver::new(AclConfig { rules: vec![] });
        assert_eq!(resolver.check("anything", "k1", None), Outcome::LeaseNotFound);
    }

    #[test]
    fn empty_allowed_keys_means_no_key_gate() {
        let resolver = AclResolver::new(AclConfig {
            rules: vec![rule("svc-a", &[], &[])],
        });

        assert_eq!(resolver.check("svc-a", "anyone", None), Outcome::Ok);
    }

    #[test]
    fn cidr_gate_rejects_unlisted_ip() {
        let resolver = AclResolver::new(AclConfig {
            rules: vec![rule("svc-a", &[], &["10.0.0.0/8"])],
        });

        assert_eq!(resolver.check("svc-a", "k1", Some("10.1.2.3".parse().unwrap())), Outcome::Ok);
        assert_eq!(resolver.check("svc-a", "k1", Some("8.8.8.8".parse().unwrap())), Outcome::IpNotWhitelisted);
        assert_eq!(resolver.check("svc-a", "k1", None), Outcome::IpNotWhitelisted);
    }

    #[test]
    fn empty_lease_id_is_invalid() {
        let resolver = AclResolver::new(AclConfig { rules: vec![] });
        assert_eq!(resolver.check("", "k1", None), Outcome::InvalidLease);
    }
}
