//! The single consumer of the result channel and the only writer of user output.

use super::channel::ResultReceiver;
use super::{CancellationController, Outcome};
use crate::report::{Console, Render};
use std::io;
use std::marker::PhantomData;
use tracing::error;

/// The order in which outcomes appear in the output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputOrder {
    /// Input order, regardless of which host answers first. Nothing is printed until every
    /// outcome is in.
    #[default]
    Submission,

    /// Completion order. Each outcome is printed as soon as it arrives.
    Arrival,
}

/// Collects outcomes, orders them, and writes them to a [Console].
///
/// All state here is owned by the one thread that drains the channel, so nothing is locked.
pub struct Aggregator<P, R> {
    order: OutputOrder,
    renderer: R,
    console: Console,
    cancel: CancellationController,
    received: Vec<(usize, Outcome<P>)>,
    started: bool,
    _payload: PhantomData<fn() -> P>,
}

impl<P, R: Render<P>> Aggregator<P, R> {
    /// `cancel` is tripped if the console fails, so that the dispatcher stops admitting work.
    pub fn new(
        order: OutputOrder,
        renderer: R,
        console: Console,
        cancel: CancellationController,
    ) -> Self {
        Aggregator {
            order,
            renderer,
            console,
            cancel,
            received: Vec::new(),
            started: false,
            _payload: PhantomData,
        }
    }

    /// Receives until `expected` outcomes have arrived or every sender is gone, then finalizes.
    ///
    /// Blocks the calling thread.
    pub fn drain(
        mut self,
        receiver: ResultReceiver<P>,
        expected: usize,
    ) -> io::Result<Vec<Outcome<P>>> {
        self.received.reserve(expected);
        for (position, outcome) in receiver.iter().take(expected) {
            self.on_outcome(position, outcome)?;
        }
        self.finalize()
    }

    /// Accepts one outcome, printing it right away if output is in arrival order.
    pub fn on_outcome(&mut self, position: usize, outcome: Outcome<P>) -> io::Result<()> {
        if self.order == OutputOrder::Arrival {
            let lines = self.renderer.render(&outcome);
            self.write(&lines)?;
        }
        self.received.push((position, outcome));
        Ok(())
    }

    /// Prints anything still buffered and returns every outcome in output order.
    pub fn finalize(mut self) -> io::Result<Vec<Outcome<P>>> {
        // Stable, so duplicate positions (which shouldn't happen) keep arrival order.
        if self.order == OutputOrder::Submission {
            self.received.sort_by_key(|(position, _)| *position);
            for index in 0..self.received.len() {
                let lines = self.renderer.render(&self.received[index].1);
                self.write(&lines)?;
            }
        }
        if !self.started {
            // Nothing arrived, but a header still tells the user the run finished.
            self.write(&[])?;
        }
        Ok(self.received.into_iter().map(|(_, outcome)| outcome).collect())
    }

    fn write(&mut self, lines: &[crate::report::Line]) -> io::Result<()> {
        let result = if self.started {
            self.console.write_lines(lines)
        } else {
            self.started = true;
            let mut block = self.renderer.header();
            block.extend_from_slice(lines);
            self.console.write_lines(&block)
        };

        if let Err(err) = &result {
            error!(error = %err, "output failed; abandoning run");
            self.cancel.trip();
        }
        result
    }
}
