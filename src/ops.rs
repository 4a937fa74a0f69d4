//! The operations the command-line tools run against each host.
//!
//! Each submodule pairs an [Operation] with the [Render] implementation that prints its payload.
//! API operations are generic over [Query] and SSH operations over [Connect], so the tests can run
//! them against fakes.
//!
//! [Operation]: crate::dispatch::Operation
//! [Render]: crate::report::Render
//! [Query]: crate::api::Query
//! [Connect]: crate::ssh::Connect

use crate::dispatch::{CancellationController, Target};
use crate::error::HostError;
use crate::ssh::Shell;
use std::future::Future;
use tokio::select;
use tracing::debug;

pub mod api_key;
pub mod command;
pub mod config;
pub mod firewalls;
pub mod interfaces;

/// Stands in for a field that a device left out of its response.
pub const NOT_AVAILABLE: &str = "n/a";

/// Runs `work` unless `cancel` trips first.
async fn cancellable<T>(
    cancel: &CancellationController,
    work: impl Future<Output = Result<T, HostError>>,
) -> Result<T, HostError> {
    select! {
        _ = cancel.cancelled() => Err(HostError::Connect("cancelled".to_string())),
        result = work => result,
    }
}

/// Closes `shell`, logging instead of failing. By this point the host's outcome is already
/// decided.
async fn close_session(host: &Target, shell: impl Shell) {
    if let Err(err) = shell.close().await {
        debug!(%host, error = %err, "failed to close SSH session");
    }
}
