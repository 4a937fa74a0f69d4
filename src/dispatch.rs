//! Runs one operation against many hosts at once and reports every result in one place.
//!
//! # Program flow
//!
//! 1. The caller builds a [TargetSet] and an [Operation] and hands both to [Dispatcher::run].
//!
//! 2. The dispatcher starts an [Aggregator] on a blocking thread. The aggregator is the only
//!    code that writes user output; it reads `(position, outcome)` pairs from the result
//!    channel.
//!
//! 3. For each target, in order, the dispatcher waits for one of `limit` concurrency permits and
//!    then spawns a worker. A worker calls the operation exactly once, converts any error or
//!    panic into a [Outcome::Failure], sends exactly one outcome, and exits. A failing host never
//!    affects any other host.
//!
//! 4. After the last worker is spawned, the dispatcher drops its sender and waits for every
//!    worker. The channel disconnects when the last worker exits, which lets the aggregator finish
//!    ordering and printing.
//!
//! 5. [Dispatcher::run] returns once all workers have exited *and* the aggregator has written
//!    everything, so the process can't exit with output still in flight.
//!
//! # Cancellation
//!
//! Tripping the [CancellationController] stops the dispatcher from admitting more work. Targets
//! whose workers had not started produce no outcome. Workers that are mid-operation are not
//! killed, since the transport might not support it, but their outcomes are discarded as soon as
//! the operation returns.
//!
//! # Errors
//!
//! Per-host errors are data, not control flow. The only errors [Dispatcher::run] returns are
//! [RunError]s: an invalid concurrency limit, or a console that can no longer be written to.

use crate::error::RunError;
use crate::report::{Console, Render};
use async_trait::async_trait;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::select;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinSet};
use tracing::{debug, error, info, warn};

pub mod aggregate;
pub mod cancel;
pub mod channel;
pub mod outcome;
pub mod target;

#[doc(inline)]
pub use aggregate::{Aggregator, OutputOrder};

#[doc(inline)]
pub use cancel::CancellationController;

#[doc(inline)]
pub use channel::{result_channel, ResultReceiver, ResultSender};

#[doc(inline)]
pub use outcome::{FailureInfo, FailureKind, Outcome};

#[doc(inline)]
pub use target::{Target, TargetSet};

/// How many operations run at once unless the user says otherwise.
pub const DEFAULT_CONCURRENCY: usize = 25;

/// The work to perform against each host, e.g. one API query or one SSH session.
///
/// Implementations are shared by every worker in a run, so they must be safe to call
/// concurrently and should not carry state from one call to the next.
#[async_trait]
pub trait Operation: Send + Sync + 'static {
    type Payload: Send + 'static;

    /// Performs the operation against `target`.
    ///
    /// `cancel` is passed through so that transports that can abandon a request early may do
    /// so. Ignoring it is fine; the dispatcher discards late results on its own.
    async fn run(
        &self,
        target: &Target,
        cancel: &CancellationController,
    ) -> anyhow::Result<Self::Payload>;
}

/// An [Operation] backed by a closure that creates a new future per host.
///
/// ```
/// use panw::dispatch::{operation_fn, Target};
///
/// let op = operation_fn(|host: Target| async move {
///     Ok::<_, anyhow::Error>(host.to_string().len())
/// });
/// # let _ = op;
/// ```
#[derive(Clone, Debug)]
pub struct OperationFn<F>(F);

pub fn operation_fn<F>(f: F) -> OperationFn<F> {
    OperationFn(f)
}

#[async_trait]
impl<F, Fut, P> Operation for OperationFn<F>
where
    F: Fn(Target) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<P>> + Send + 'static,
    P: Send + 'static,
{
    type Payload = P;

    async fn run(&self, target: &Target, _cancel: &CancellationController) -> anyhow::Result<P> {
        (self.0)(target.clone()).await
    }
}

/// How a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    /// Every target produced a successful outcome. This includes a run with no targets.
    Succeeded,

    /// Every target produced an outcome, and at least one of them is a failure.
    HostsFailed,

    /// The run was cancelled before every target produced an outcome.
    Cancelled,
}

/// Counts describing a finished run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub status: RunStatus,

    /// Targets handed to the dispatcher.
    pub submitted: usize,

    /// Outcomes that reached the output.
    pub completed: usize,

    /// Completed outcomes that are failures.
    pub failed: usize,

    /// Targets that produced no outcome because of cancellation.
    pub abandoned: usize,
}

impl RunSummary {
    /// `true` if there was at least one target and none of them succeeded.
    pub fn all_failed(&self) -> bool {
        self.status == RunStatus::HostsFailed && self.failed == self.submitted
    }
}

/// Everything a run produced: the outcomes, in output order, and a summary.
#[derive(Debug)]
pub struct RunReport<P> {
    pub outcomes: Vec<Outcome<P>>,
    pub summary: RunSummary,
}

/// Bookkeeping for one call to [Dispatcher::run]. Workers never touch it.
#[derive(Debug, Default)]
struct RunState {
    submitted: usize,
    started: usize,
    discarded: usize,
}

impl RunState {
    fn new(submitted: usize) -> Self {
        RunState {
            submitted,
            ..Default::default()
        }
    }

    fn finish<P>(self, outcomes: Vec<Outcome<P>>, tripped: bool) -> RunReport<P> {
        let completed = outcomes.len();
        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        let abandoned = self.submitted - completed;

        let status = if tripped && abandoned > 0 {
            RunStatus::Cancelled
        } else if failed > 0 {
            RunStatus::HostsFailed
        } else {
            RunStatus::Succeeded
        };

        let summary = RunSummary {
            status,
            submitted: self.submitted,
            completed,
            failed,
            abandoned,
        };
        match status {
            RunStatus::Cancelled => warn!(
                completed,
                abandoned,
                started = self.started,
                discarded = self.discarded,
                "run cancelled"
            ),
            _ => info!(submitted = self.submitted, completed, failed, "run finished"),
        }
        RunReport { outcomes, summary }
    }
}

/// One target bound to the shared operation, owned by exactly one worker.
struct WorkItem<O> {
    position: usize,
    target: Target,
    operation: Arc<O>,
    cancel: CancellationController,
}

/// What a worker did with its outcome.
enum Delivery {
    Emitted,
    Discarded,
}

impl<O: Operation> WorkItem<O> {
    async fn execute(self, sender: ResultSender<O::Payload>) -> Delivery {
        let WorkItem {
            position,
            target,
            operation,
            cancel,
        } = self;

        debug!(host = %target, "starting");
        let result = AssertUnwindSafe(operation.run(&target, &cancel))
            .catch_unwind()
            .await;

        if cancel.is_tripped() {
            debug!(host = %target, "cancelled; discarding result");
            return Delivery::Discarded;
        }

        let outcome = match result {
            Ok(Ok(payload)) => {
                debug!(host = %target, "succeeded");
                Outcome::Success {
                    host: target,
                    payload,
                }
            }
            Ok(Err(err)) => {
                let info = FailureInfo::from_error(target, &err);
                warn!(host = %info.host, cause = %info.cause, "host failed");
                Outcome::Failure(info)
            }
            Err(panic) => {
                let info = FailureInfo::panicked(target, panic);
                error!(host = %info.host, cause = %info.cause, "operation panicked");
                Outcome::Failure(info)
            }
        };

        // The aggregator only hangs up early if the console failed, and the run is already
        // over in that case.
        match sender.send((position, outcome)) {
            Ok(()) => Delivery::Emitted,
            Err(_) => Delivery::Discarded,
        }
    }
}

/// Runs operations against targets with bounded concurrency. See the [module docs](self).
#[derive(Clone, Debug)]
pub struct Dispatcher {
    limit: usize,
    order: OutputOrder,
    cancel: CancellationController,
}

impl Dispatcher {
    /// Creates a dispatcher that runs at most `limit` operations at once.
    ///
    /// # Errors
    ///
    /// Returns [RunError::InvalidConcurrency] if `limit` is zero.
    pub fn new(limit: usize) -> Result<Self, RunError> {
        if limit == 0 {
            return Err(RunError::InvalidConcurrency);
        }
        Ok(Dispatcher {
            limit,
            order: OutputOrder::default(),
            cancel: CancellationController::new(),
        })
    }

    pub fn with_order(mut self, order: OutputOrder) -> Self {
        self.order = order;
        self
    }

    /// Uses an existing controller, e.g. one already wired to an interrupt handler.
    pub fn with_cancellation(mut self, cancel: CancellationController) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation(&self) -> &CancellationController {
        &self.cancel
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Runs `operation` against every target and writes the outcomes to `console`.
    ///
    /// Returns after every started worker has exited and every outcome has been written.
    ///
    /// # Errors
    ///
    /// Returns [RunError::Sink] if writing to `console` fails, or [RunError::Aggregator] if the
    /// aggregator thread dies. Host failures are reported in the returned [RunReport] instead.
    pub async fn run<O, R>(
        &self,
        targets: TargetSet,
        operation: Arc<O>,
        renderer: R,
        console: Console,
    ) -> Result<RunReport<O::Payload>, RunError>
    where
        O: Operation,
        R: Render<O::Payload> + 'static,
    {
        let mut state = RunState::new(targets.len());
        info!(
            targets = state.submitted,
            limit = self.limit,
            order = ?self.order,
            "dispatching"
        );

        let aggregator = Aggregator::new(self.order, renderer, console, self.cancel.clone());
        if targets.is_empty() {
            let outcomes = aggregator.finalize()?;
            return Ok(state.finish(outcomes, self.cancel.is_tripped()));
        }

        let (sender, receiver) = result_channel();
        let expected = targets.len();
        let drain = task::spawn_blocking(move || aggregator.drain(receiver, expected));

        let semaphore = Arc::new(Semaphore::new(self.limit));
        let mut workers = JoinSet::new();
        for (position, target) in targets.into_iter().enumerate() {
            let permit = select! {
                biased;
                _ = self.cancel.cancelled() => break,
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_closed) => break,
                },
            };

            let item = WorkItem {
                position,
                target,
                operation: operation.clone(),
                cancel: self.cancel.clone(),
            };
            let sender = sender.clone();
            state.started += 1;
            workers.spawn(async move {
                let _permit = permit;
                item.execute(sender).await
            });
        }
        drop(sender);

        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(Delivery::Emitted) => {}
                Ok(Delivery::Discarded) => state.discarded += 1,
                Err(err) => {
                    error!(error = %err, "worker did not finish");
                    state.discarded += 1;
                }
            }
        }

        let outcomes = match drain.await {
            Ok(result) => result?,
            Err(err) => return Err(RunError::Aggregator(err.to_string())),
        };
        Ok(state.finish(outcomes, self.cancel.is_tripped()))
    }
}
