//! Error types shared by the dispatcher and the transports.
//!
//! Two families exist and they never mix:
//!
//! - [HostError] describes why a single host could not produce a result. It is data: the
//!   dispatcher turns it into a [Failure] outcome and moves on.
//! - [RunError] describes why the run as a whole cannot continue. It aborts the run.
//!
//! [Failure]: crate::dispatch::Outcome::Failure

use std::io;
use thiserror::Error;

/// A failure confined to one host.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum HostError {
    /// The host could not be reached or refused the connection.
    #[error("Unable to connect to host ({0})")]
    Connect(String),

    /// The host answered with a non-success HTTP status.
    #[error("HTTP {status}: {reason}")]
    Http { status: u16, reason: String },

    /// The host answered, but reported an error in the response body.
    #[error("API error: {0}")]
    Api(String),

    /// The response could not be interpreted.
    #[error("Unable to parse response ({0})")]
    Parse(String),

    /// A remote shell session failed or a command exited unsuccessfully.
    #[error("SSH error: {0}")]
    Ssh(String),
}

impl HostError {
    /// Returns `true` if the host answered but its answer was unusable.
    pub fn is_parse(&self) -> bool {
        matches!(self, HostError::Parse(_) | HostError::Api(_))
    }
}

impl From<reqwest::Error> for HostError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => HostError::Http {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("unknown").to_string(),
            },
            None if err.is_decode() => HostError::Parse(err.to_string()),
            None => HostError::Connect(err.to_string()),
        }
    }
}

impl From<openssh::Error> for HostError {
    fn from(err: openssh::Error) -> Self {
        HostError::Ssh(err.to_string())
    }
}

impl From<roxmltree::Error> for HostError {
    fn from(err: roxmltree::Error) -> Self {
        HostError::Parse(err.to_string())
    }
}

/// A failure that stops the whole run.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RunError {
    /// The dispatcher was asked to run with no concurrency at all.
    #[error("concurrency limit must be at least 1")]
    InvalidConcurrency,

    /// Writing results to the output failed, so no further output can be trusted.
    #[error("failed to write results: {0}")]
    Sink(#[from] io::Error),

    /// The aggregator thread died before it finished draining results.
    #[error("result aggregator stopped unexpectedly: {0}")]
    Aggregator(String),
}
