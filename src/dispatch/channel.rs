//! The conduit from workers to the aggregator.
//!
//! Any number of workers send; exactly one aggregator receives. Sends never block, so a worker is
//! never held up by slow output, and the channel disconnects on its own once the last worker has
//! dropped its sender. Ordering is not the channel's concern: each message carries the target's
//! submission position so that the aggregator can restore order if asked to.

use super::Outcome;
use crossbeam::channel::{self, Receiver, Sender};

/// One delivered result: the target's submission position and its outcome.
pub type Delivery<P> = (usize, Outcome<P>);

pub type ResultSender<P> = Sender<Delivery<P>>;
pub type ResultReceiver<P> = Receiver<Delivery<P>>;

/// Creates a new, unbounded result channel.
pub fn result_channel<P>() -> (ResultSender<P>, ResultReceiver<P>) {
    channel::unbounded()
}
