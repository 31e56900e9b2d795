//! TLS configuration for secure connections.

use std::path::PathBuf;

use serde::Deserialize;

/// TLS configuration, loaded from `TLS_CONFIG_PATH` (default `./tls.yaml`).
///
/// Either `static_` or `acme` names the certificate source; exactly one
/// should be present.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct TlsConfig {
    /// Statically configured certificate/key PEM files.
    pub static_: Option<StaticTlsConfig>,
    /// ACME-managed certificate.
    pub acme: Option<AcmeConfig>,
}

/// A statically configured certificate and private key pair.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticTlsConfig {
    /// Path to the TLS certificate PEM file.
    pub certificate: PathBuf,
    /// Path to the TLS private key PEM file.
    pub key: PathBuf,
}

/// ACME-managed certificate configuration.
///
/// The ACME client itself is an external collaborator this crate does not
/// implement; [`AcmeConfig`] only carries the parameters one would need to
/// wire one in.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AcmeConfig {
    /// Domains to request a certificate for.
    pub domains: Vec<String>,
    /// Contact email registered with the ACME account.
    pub email: String,
    /// Directory used to cache the issued certificate and account key.
    pub cache_dir: PathBuf,
}

impl TlsConfig {
    /// Resolves the effective certificate/key pair to serve.
    ///
    /// No ACME client is wired in this crate, so an `acme` block currently
    /// falls back to `static_` and logs a warning rather than issuing a
    /// certificate. This keeps the contract visible without a `todo!`.
    pub fn resolve_static(&self) -> Option<&StaticTlsConfig> {
        if let Some(acme) = &self.acme {
            log::warn!(
                "ACME is configured for domains {:?} but no ACME client is wired; falling back to static certificate",
                acme.domains
            );
        }

        self.static_.as_ref()
    }
}
