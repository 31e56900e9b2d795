//! The gateway's unified error type and its JSON response rendering.

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use http::{HeaderValue, StatusCode, header};
use serde::Serialize;

/// Every way a pipeline stage can short-circuit a request, carrying enough
/// information to render the response spec.md §7 requires.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// No `Authorization`/`X-API-Key` header was present.
    #[error("missing API key")]
    MissingApiKey,
    /// The presented key did not match any configured key.
    #[error("invalid API key")]
    InvalidApiKey,
    /// The presented key matched, but has expired.
    #[error("expired API key")]
    ExpiredApiKey,
    /// The caller's scopes don't include the one the endpoint requires.
    #[error("access denied")]
    AccessDenied,
    /// No ACL rule matches the requested lease.
    #[error("lease not found")]
    LeaseNotFound,
    /// The caller's IP is not in the rule's allowed CIDRs.
    #[error("IP not whitelisted")]
    IpNotWhitelisted,
    /// The lease id in the path failed the wildcard grammar.
    #[error("invalid lease id")]
    InvalidLeaseId,
    /// The per-lease deadline elapsed before the handler produced a response.
    #[error("gateway timeout")]
    GatewayTimeout,
    /// The lease's circuit breaker is open.
    #[error("service unavailable")]
    ServiceUnavailable,
    /// The per-lease token bucket is empty.
    #[error("too many requests")]
    TooManyRequests {
        /// Seconds the client should wait before retrying.
        retry_after: u64,
    },
    /// A quota cap (requests, bytes, or connections) has been exceeded.
    #[error("quota exceeded")]
    QuotaExceeded,
    /// The gateway is draining for shutdown.
    #[error("shutting down")]
    ShuttingDown,
    /// The backing store failed in a way that must fail the request closed.
    #[error("storage error: {0}")]
    Storage(#[from] storage::StorageError),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after: Option<u64>,
}

impl GatewayError {
    /// The stable machine-readable error code from spec.md §7.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingApiKey => "missing_api_key",
            Self::InvalidApiKey => "invalid_api_key",
            Self::ExpiredApiKey => "expired_api_key",
            Self::AccessDenied => "access_denied",
            Self::LeaseNotFound => "lease_not_found",
            Self::IpNotWhitelisted => "ip_not_whitelisted",
            Self::InvalidLeaseId => "invalid_lease_id",
            Self::GatewayTimeout => "gateway_timeout",
            Self::ServiceUnavailable => "service_unavailable",
            Self::TooManyRequests { .. } => "too_many_requests",
            Self::QuotaExceeded => "quota_exceeded",
            Self::ShuttingDown => "shutting_down",
            Self::Storage(_) => "storage_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::MissingApiKey | Self::InvalidApiKey | Self::ExpiredApiKey => StatusCode::UNAUTHORIZED,
            Self::AccessDenied | Self::IpNotWhitelisted => StatusCode::FORBIDDEN,
            Self::LeaseNotFound => StatusCode::NOT_FOUND,
            Self::InvalidLeaseId => StatusCode::BAD_REQUEST,
            Self::GatewayTimeout => StatusCode::GATEWAY_TIMEOUT,
            Self::ServiceUnavailable | Self::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
            Self::TooManyRequests { .. } | Self::QuotaExceeded => StatusCode::TOO_MANY_REQUESTS,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn retry_after(&self) -> Option<u64> {
        match self {
            Self::TooManyRequests { retry_after } => Some(*retry_after),
            Self::QuotaExceeded => Some(60),
            _ => None,
        }
    }
}

impl From<auth::AuthError> for GatewayError {
    fn from(value: auth::AuthError) -> Self {
        match value {
            auth::AuthError::Missing => Self::MissingApiKey,
            auth::AuthError::Invalid => Self::InvalidApiKey,
            auth::AuthError::Expired => Self::ExpiredApiKey,
        }
    }
}

impl From<rate_limit::RateLimitError> for GatewayError {
    fn from(value: rate_limit::RateLimitError) -> Self {
        let rate_limit::RateLimitError::Throttled { retry_after } = value;
        Self::TooManyRequests { retry_after: retry_after.as_secs().max(1) }
    }
}

impl From<circuit_breaker::CircuitOpen> for GatewayError {
    fn from(_: circuit_breaker::CircuitOpen) -> Self {
        Self::ServiceUnavailable
    }
}

impl From<quota::QuotaError> for GatewayError {
    fn from(value: quota::QuotaError) -> Self {
        match value {
            quota::QuotaError::RequestCapExceeded | quota::QuotaError::ByteCapExceeded | quota::QuotaError::ConnectionCapExceeded => {
                Self::QuotaExceeded
            }
            quota::QuotaError::Storage(e) => Self::Storage(e),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let retry_after = self.retry_after();

        let body = ErrorBody { error: self.code(), message: self.to_string(), retry_after };

        let mut response = (status, Json(body)).into_response();

        if let Some(seconds) = retry_after
            && let Ok(value) = HeaderValue::from_str(&seconds.to_string())
        {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }

        response
    }
}
