//! Request information for rate limiting.

use std::net::IpAddr;

/// The identifying information a rate-limit check needs from a request.
#[derive(Debug, Clone)]
pub struct RateLimitRequest {
    /// The lease the request targets, if any.
    pub lease_id: Option<String>,
    /// The authenticated principal's key id, if the request is authenticated.
    pub key_id: Option<String>,
    /// The request's source IP, used when there is no authenticated principal.
    pub ip: Option<IpAddr>,
}

impl RateLimitRequest {
    /// Create a new builder for a rate limit request.
    pub fn builder() -> RateLimitRequestBuilder {
        RateLimitRequestBuilder::default()
    }
}

/// Builder for creating rate limit requests.
#[derive(Debug, Default)]
pub struct RateLimitRequestBuilder {
    lease_id: Option<String>,
    key_id: Option<String>,
    ip: Option<IpAddr>,
}

impl RateLimitRequestBuilder {
    /// Set the lease id.
    pub fn lease(mut self, lease_id: impl Into<String>) -> Self {
        self.lease_id = Some(lease_id.into());
        self
    }

    /// Set the authenticated principal's key id.
    pub fn key(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }

    /// Set the source IP address.
    pub fn ip(mut self, ip: IpAddr) -> Self {
        self.ip = Some(ip);
        self
    }

    /// Build the rate limit request.
    pub fn build(self) -> RateLimitRequest {
        RateLimitRequest {
            lease_id: self.lease_id,
            key_id: self.key_id,
            ip: self.ip,
        }
    }
}
