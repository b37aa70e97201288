// SPDX-FileCopyrightText: 2026 Alumnet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signal handling for long-running commands.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Returns a token that is cancelled on SIGINT or SIGTERM.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => info!("received SIGINT, stopping"),
                        _ = sigterm.recv() => info!("received SIGTERM, stopping"),
                    }
                }
                Err(e) => {
                    warn!(error = %e, "SIGTERM handler unavailable, listening for Ctrl+C only");
                    let _ = ctrl_c.await;
                    info!("received SIGINT, stopping");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, stopping");
        }

        trigger.cancel();
        debug!("signal handler finished");
    });

    token
}
