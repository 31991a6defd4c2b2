//! Signal handling

use anyhow::{Context, Result};
use tokio::signal::unix::{SignalKind, signal};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Install a handler that listens for SIGTERM and SIGINT
///
/// Returns a `CancellationToken` that is cancelled when either signal is
/// received. The job controller stops waiting when it fires and leaves the
/// job on the cluster as it is.
pub fn install_shutdown_handler() -> Result<CancellationToken> {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
    let mut sigint =
        signal(SignalKind::interrupt()).context("Failed to install SIGINT handler")?;

    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM, stopping");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT, stopping");
            }
        }

        token_clone.cancel();
    });

    Ok(token)
}
