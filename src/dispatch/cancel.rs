//! A process-wide switch that stops a run early.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Trips once and stays tripped. Clones share the same switch.
///
/// [CancellationController::is_tripped] is a single atomic load, so workers can poll it freely.
/// [CancellationController::cancelled] lets async code wait for the trip instead of polling.
#[derive(Clone, Debug, Default)]
pub struct CancellationController {
    tripped: Arc<AtomicBool>,
    token: CancellationToken,
}

impl CancellationController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trips the switch. Safe to call from any thread, any number of times.
    ///
    /// Returns `true` only for the call that actually tripped it.
    pub fn trip(&self) -> bool {
        let first = !self.tripped.swap(true, Ordering::AcqRel);
        if first {
            self.token.cancel();
        }
        first
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::Acquire)
    }

    /// Completes once the switch has been tripped.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}
