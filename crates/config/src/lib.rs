//! Configuration structures for the gateway: one module per concern, each
//! loaded from its own YAML file (see [`loader`]).

#![deny(missing_docs)]

mod acl;
mod auth;
mod breaker;
mod health;
mod loader;
mod quota;
mod rate_limit;
mod server;
mod timeout;
mod tls;

pub use acl::{AclConfig, AclRule, PatternError};
pub use auth::{ApiKeyConfig, AuthConfig, ConfigError as AuthConfigError, KEY_PREFIXES};
pub use breaker::BreakerConfig;
pub use health::HealthConfig;
pub use loader::{auth_config_path, load_acl, load_auth, load_quota, load_rate_limits, load_server, load_tls};
pub use quota::{QuotaConfig, QuotaLimit, QuotaStorageConfig};
pub use rate_limit::{LeaseRateLimitRule, RateLimitConfig, RateLimitQuota};
pub use server::ServerConfig;
pub use timeout::{LeaseTimeoutRule, TimeoutConfig};
pub use tls::{AcmeConfig, StaticTlsConfig, TlsConfig};

#[cfg(test)]
mod tests {
    use insta::assert_debug_snapshot;

    use crate::{QuotaConfig, RateLimitConfig, ServerConfig};

    #[test]
    fn server_defaults() {
        assert_debug_snapshot!(ServerConfig::default(), @r#"
        ServerConfig {
            listen_address: 0.0.0.0:8080,
            health: HealthConfig {
                enabled: true,
                listen: None,
                path: "/health",
            },
            breaker: BreakerConfig {
                consecutive_failure_threshold: 5,
                open_timeout_secs: 30,
                max_half_open_requests: 1,
            },
            timeout: TimeoutConfig {
                default_ms: 30000,
                leases: [],
            },
        }
        "#);
    }

    #[test]
    fn rate_limit_defaults() {
        assert_debug_snapshot!(RateLimitConfig::default(), @r#"
        RateLimitConfig {
            default: RateLimitQuota {
                rate_per_second: 10.0,
                burst: 20,
            },
            leases: [],
        }
        "#);
    }

    #[test]
    fn quota_defaults() {
        assert_debug_snapshot!(QuotaConfig::default(), @r#"
        QuotaConfig {
            default: QuotaLimit {
                monthly_request_cap: 0,
                monthly_bytes_cap: 0,
                concurrent_connection_cap: 0,
            },
            storage: Memory,
            keys: {},
        }
        "#);
    }
}
