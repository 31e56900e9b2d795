//! Access-control configuration: lease → allowed principals/IPs.

use std::collections::BTreeSet;

use ipnet::IpNet;
use serde::{Deserialize, Serialize};

/// Top-level ACL configuration, loaded from the ACL YAML file.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct AclConfig {
    /// The configured rules, in file order (wildcard tie-breaking uses this
    /// order per §4.4).
    pub rules: Vec<AclRule>,
}

/// A single ACL rule binding a lease pattern to allowed keys and CIDRs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AclRule {
    /// Exact lease id, or a trailing-`*` prefix pattern.
    pub lease_id_pattern: String,
    /// Key ids allowed to reach this lease.
    #[serde(default)]
    pub allowed_key_ids: BTreeSet<String>,
    /// CIDR blocks allowed to reach this lease. Empty means "no IP check".
    #[serde(default)]
    pub allowed_cidrs: Vec<IpNet>,
}

/// Errors raised validating a wildcard pattern.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PatternError {
    /// More than one `*` appears in the pattern.
    #[error("pattern '{0}' contains more than one wildcard")]
    MultipleWildcards(String),
    /// `*` appears somewhere other than the last character.
    #[error("pattern '{0}' has a non-trailing wildcard")]
    NonTrailingWildcard(String),
    /// The pattern (including its wildcard) is shorter than two characters.
    #[error("pattern '{0}' is too short")]
    TooShort(String),
}

/// Validates the wildcard grammar shared by ACL and rate-limit rules:
/// any `*` occurs exactly once, as the last character, and the pattern is
/// at least two characters long.
pub fn validate_pattern(pattern: &str) -> Result<(), PatternError> {
    let wildcard_count = pattern.matches('*').count();

    if wildcard_count > 1 {
        return Err(PatternError::MultipleWildcards(pattern.to_string()));
    }

    if wildcard_count == 1 && !pattern.ends_with('*') {
        return Err(PatternError::NonTrailingWildcard(pattern.to_string()));
    }

    if pattern.len() < 2 {
        return Err(PatternError::TooShort(pattern.to_string()));
    }

    Ok(())
}

impl AclRule {
    /// Validates this rule's pattern grammar.
    pub fn validate(&self) -> Result<(), PatternError> {
        validate_pattern(&self.lease_id_pattern)
    }

    /// The literal prefix of a wildcard pattern, or the whole pattern if exact.
    pub fn literal_prefix(&self) -> &str {
        self.lease_id_pattern.strip_suffix('*').unwrap_or(&self.lease_id_pattern)
    }

    /// Whether this rule's pattern is a trailing-wildcard pattern.
    pub fn is_wildcard(&self) -> bool {
        self.lease_id_pattern.ends_with('*')
    }
}

impl AclConfig {
    /// Validates every rule's wildcard grammar.
    pub fn validate(&self) -> Result<(), PatternError> {
        for rule in &self.rules {
            rule.validate()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_multiple_wildcards() {
        assert_eq!(
            validate_pattern("a*b*"),
            Err(PatternError::MultipleWildcards("a*b*".into()))
        );
    }

    #[test]
    fn rejects_non_trailing_wildcard() {
        assert_eq!(
            validate_pattern("a*b"),
            Err(PatternError::NonTrailingWildcard("a*b".into()))
        );
    }

    #[test]
    fn rejects_too_short() {
        assert_eq!(validate_pattern("*"), Err(PatternError::TooShort("*".into())));
    }

    #[test]
    fn accepts_exact_and_trailing_wildcard() {
        assert!(validate_pattern("mcp-server-1").is_ok());
        assert!(validate_pattern("mcp-*").is_ok());
    }
}
