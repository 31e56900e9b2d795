//! HTTP server configuration settings.

use std::net::SocketAddr;

use serde::Deserialize;

use crate::{BreakerConfig, HealthConfig, TimeoutConfig};

/// HTTP server configuration settings: where to listen, the health endpoint,
/// and breaker tuning. TLS, auth, ACL, rate-limit and quota configuration
/// each live in their own file and are loaded independently (see
/// [`crate::loader`]).
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// The socket address the server should listen on.
    pub listen_address: SocketAddr,
    /// Health endpoint configuration.
    pub health: HealthConfig,
    /// Circuit-breaker tuning, shared by every lease.
    pub breaker: BreakerConfig,
    /// Per-lease request deadlines.
    pub timeout: TimeoutConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: ([0, 0, 0, 0], 8080).into(),
            health: HealthConfig::default(),
            breaker: BreakerConfig::default(),
            timeout: TimeoutConfig::default(),
        }
    }
}
