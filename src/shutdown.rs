//! Graceful shutdown handler.

use tokio::sync::watch;
use tracing::{error, warn};

/// First Ctrl+C asks the pipeline to stop after the candidate in flight.
/// Second Ctrl+C exits immediately.
pub fn spawn_ctrl_c_handler() -> watch::Receiver<bool> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received Ctrl+C, finishing the current candidate before stopping");
            warn!("Press Ctrl+C again to force quit");
            let _ = shutdown_tx.send(true);

            if tokio::signal::ctrl_c().await.is_ok() {
                error!("Force quit requested, exiting immediately");
                std::process::exit(130);
            }
        }
    });

    shutdown_rx
}
