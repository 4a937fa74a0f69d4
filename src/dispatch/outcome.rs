//! The result of running an operation against one host.

use super::Target;
use crate::error::HostError;
use std::any::Any;
use std::fmt::{self, Display};

/// The result of running an operation against one [Target]. Immutable once produced.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome<P> {
    /// The operation returned a payload.
    Success { host: Target, payload: P },

    /// The operation failed. The failure stays confined to this host.
    Failure(FailureInfo),
}

impl<P> Outcome<P> {
    /// The host this outcome belongs to.
    pub fn host(&self) -> &Target {
        match self {
            Outcome::Success { host, .. } => host,
            Outcome::Failure(info) => &info.host,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn payload(&self) -> Option<&P> {
        match self {
            Outcome::Success { payload, .. } => Some(payload),
            Outcome::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&FailureInfo> {
        match self {
            Outcome::Success { .. } => None,
            Outcome::Failure(info) => Some(info),
        }
    }
}

/// Broad classification of a per-host failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// The host could not be reached, authenticated, or talked to.
    Transport,

    /// The host answered, but its answer could not be used.
    Parse,

    /// The operation panicked.
    Panicked,
}

/// Why an operation failed for one host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailureInfo {
    pub host: Target,
    pub kind: FailureKind,

    /// A human-readable cause, including any context attached along the way.
    pub cause: String,
}

impl FailureInfo {
    /// Classifies an operation error.
    ///
    /// Errors that wrap a [HostError] take its classification; anything else counts as a
    /// transport failure.
    pub fn from_error(host: Target, err: &anyhow::Error) -> Self {
        let kind = match err.downcast_ref::<HostError>() {
            Some(host_err) if host_err.is_parse() => FailureKind::Parse,
            _ => FailureKind::Transport,
        };
        FailureInfo {
            host,
            kind,
            cause: format!("{err:#}"),
        }
    }

    /// Builds a failure from a caught panic payload.
    pub fn panicked(host: Target, panic: Box<dyn Any + Send>) -> Self {
        let message = match panic.downcast::<String>() {
            Ok(message) => *message,
            Err(panic) => match panic.downcast::<&'static str>() {
                Ok(message) => message.to_string(),
                Err(_) => "unknown panic".to_string(),
            },
        };
        FailureInfo {
            host,
            kind: FailureKind::Panicked,
            cause: format!("operation panicked: {message}"),
        }
    }
}

impl Display for FailureInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cause)
    }
}
