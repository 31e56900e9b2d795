//! Background hot-reload loop for the auth config file.

use std::{path::PathBuf, sync::Arc};

use crate::Authenticator;

/// Polls `path`'s mtime every `authenticator`'s configured
/// `reload_interval`, reloading and atomically swapping the key set when it
/// changes. Runs until the returned task is aborted or the process exits.
pub fn spawn_watch(authenticator: Arc<Authenticator>, path: PathBuf, reload_interval: std::time::Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut last_modified = std::fs::metadata(&path).and_then(|m| m.modified()).ok();

        loop {
            tokio::time::sleep(reload_interval).await;

            let modified = match std::fs::metadata(&path).and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(err) => {
                    log::warn!("failed to stat auth config at {}: {err}", path.display());
                    continue;
                }
            };

            if last_modified == Some(modified) {
                continue;
            }

            match reload(&path) {
                Ok(config) => {
                    authenticator.set_config(config);
                    last_modified = Some(modified);
                    log::info!("reloaded auth config from {}", path.display());
                }
                Err(err) => {
                    log::error!("failed to reload auth config from {}: {err}", path.display());
                }
            }
        }
    })
}

fn reload(path: &std::path::Path) -> anyhow::Result<config::AuthConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: config::AuthConfig = serde_yaml::from_str(&content)?;
    config.validate()?;

    Ok(config)
}
