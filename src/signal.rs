//! Turns interrupt signals into cancellation.
//!
//! On Unix, SIGINT, SIGTERM, and SIGQUIT all cancel the run, as does Ctrl-C on any platform. The
//! first signal trips the [CancellationController]; a second one ends the process immediately, for
//! when a host refuses to let go.

use crate::dispatch::CancellationController;
use tokio::task::JoinHandle;
use tracing::{error, warn};

/// The exit code of a process killed by SIGINT, by shell convention.
pub const INTERRUPTED: i32 = 130;

/// Completes when the process receives a termination signal.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {},
        _ = sigint.recv() => {},
        _ = sigterm.recv() => {},
        _ = sigquit.recv() => {},
    }
    Ok(())
}

/// Completes when the process receives a termination signal.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

/// Spawns a task that trips `cancel` on the first signal and exits on the second.
///
/// Abort the returned handle once the run is over.
pub fn cancel_on_signal(cancel: CancellationController) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(err) = wait_for_shutdown_signal().await {
            error!(error = %err, "unable to listen for signals");
            return;
        }
        warn!("interrupted; waiting for operations in progress");
        cancel.trip();

        if wait_for_shutdown_signal().await.is_ok() {
            std::process::exit(INTERRUPTED);
        }
    })
}
