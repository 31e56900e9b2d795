//! Gateway core library.
//!
//! Provides a reusable `serve` function used by both the binary and the
//! integration tests, mirroring the teacher's `server` crate.

#![deny(missing_docs)]

mod admin;
mod context;
mod error;
mod health;
pub mod middleware;
mod pipeline;
mod shutdown;
mod state;
mod storage_backend;
mod terminal;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context as _, anyhow};
use auth::Authenticator;
use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use config::{AclConfig, AuthConfig, QuotaConfig, RateLimitConfig, ServerConfig, TlsConfig};
use telemetry::Metrics;

pub use context::RequestContext;
pub use error::GatewayError;
pub use state::AppState;
pub use storage_backend::AnyStorage;

/// Everything [`serve`] needs: the loaded configuration for every concern,
/// plus the address to listen on.
pub struct ServeConfig {
    /// Server-level settings: listen address, health endpoint, breaker and
    /// timeout tuning.
    pub server: ServerConfig,
    /// API key configuration, hot-reloaded from its source file.
    pub auth: AuthConfig,
    /// Path `auth` was loaded from, for the hot-reload watcher.
    pub auth_config_path: std::path::PathBuf,
    /// Access-control rule table.
    pub acl: AclConfig,
    /// Per-lease rate-limit policy.
    pub rate_limits: RateLimitConfig,
    /// Quota caps and storage backend selection.
    pub quota: QuotaConfig,
    /// TLS configuration, or `None` to serve plaintext HTTP.
    pub tls: Option<TlsConfig>,
}

/// Starts and runs the gateway with the provided configuration, returning
/// once it has drained for shutdown.
pub async fn serve(config: ServeConfig) -> anyhow::Result<()> {
    let ServeConfig { server, auth, auth_config_path, acl, rate_limits, quota, tls } = config;

    let reload_interval = auth.reload_interval;
    let authenticator = Arc::new(Authenticator::new(auth));
    let _reload_handle = auth::spawn_watch(authenticator.clone(), auth_config_path, reload_interval);

    let storage = AnyStorage::connect(&quota.storage).await.context("failed to connect quota/DLQ storage backend")?;
    let quota_manager = quota::QuotaManager::new(quota, storage);

    let cleanup_interval = rate_limits.cleanup_interval();
    let state = AppState::new(authenticator, acl, server.breaker, rate_limits, server.timeout, quota_manager, Metrics::new());
    let _cleanup_handle = rate_limit::spawn_cleanup(state.rate_limiter.clone(), cleanup_interval);

    let app = pipeline::build(state.clone());

    let listener = tokio::net::TcpListener::bind(server.listen_address)
        .await
        .with_context(|| format!("failed to bind to {}", server.listen_address))?;

    let handle = Handle::new();
    let mut handles = vec![("main", handle.clone())];

    if server.health.enabled
        && let Some(health_addr) = server.health.listen
    {
        let health_handle = Handle::new();
        handles.push(("health", health_handle.clone()));
        tokio::spawn(bind_health_listener(health_addr, state.clone(), health_handle));
    }

    let shutdown = tokio::spawn(shutdown::wait_and_drain(state, handles, std::time::Duration::from_secs(30)));

    let serve_result = match tls.as_ref().and_then(|tls| tls.resolve_static()) {
        Some(static_tls) => {
            let rustls_config = RustlsConfig::from_pem_file(&static_tls.certificate, &static_tls.key)
                .await
                .map_err(|err| anyhow!("failed to load TLS certificate and key: {err}"))?;

            log::info!("gateway listening on https://{}", server.listen_address);

            axum_server::from_tcp_rustls(listener.into_std()?, rustls_config)
                .handle(handle)
                .serve(app.into_make_service_with_connect_info::<SocketAddr>())
                .await
        }
        None => {
            log::info!("gateway listening on http://{}", server.listen_address);

            axum_server::from_tcp(listener.into_std()?)
                .handle(handle)
                .serve(app.into_make_service_with_connect_info::<SocketAddr>())
                .await
        }
    };

    serve_result.map_err(|err| anyhow!("gateway server error: {err}"))?;

    shutdown.await.context("shutdown task panicked")?
}

async fn bind_health_listener(addr: SocketAddr, state: AppState, handle: Handle) {
    let app = axum::Router::new()
        .route("/health", axum::routing::get(health::health))
        .with_state(state);

    log::info!("health endpoint exposed on http://{addr}");

    if let Err(err) = axum_server::bind(addr).handle(handle).serve(app.into_make_service_with_connect_info::<SocketAddr>()).await {
        log::error!("health endpoint listener failed: {err}");
    }
}
