//! Utilities for querying Palo Alto Networks firewalls and Panorama, many hosts at a time.
//!
//! # Tools
//!
//! Each tool is a binary under `src/bin/`, and all of them are also subcommands of `panw-utils`:
//!
//! - `get-panw-api-key` generates an API key.
//! - `get-panw-firewalls` lists the firewalls that Panorama manages.
//! - `get-panw-interfaces` lists each firewall's interfaces.
//! - `get-panw-config` prints each firewall's configuration, as XML or as `set` commands.
//! - `run-panw-cmd` (or `exec-panw-cmd`) runs CLI commands on each firewall.
//!
//! Tools read hosts from stdin, so they can be chained, e.g.
//! `get-panw-firewalls -t | get-panw-interfaces -t`.
//!
//! # Program flow
//!
//! This section is meant for developers. If you are using the tools, you don't need to read it.
//!
//! 1. A binary parses its arguments and hands them to its module under [cli].
//!
//! 2. The [cli] module loads the [settings], prompting for anything missing, and works out which
//!    hosts to contact.
//!
//! 3. The tool builds an [Operation](dispatch::Operation) from [ops] on top of a transport: the
//!    XML [api] or [ssh].
//!
//! 4. The [Dispatcher](dispatch::Dispatcher) runs the operation against every host, a bounded
//!    number at a time, and streams each host's outcome through a [report] renderer as it
//!    arrives. An interrupt ([signal]) cancels the run.
//!
//! 5. The tool prints a summary of any failures and exits with a status that reflects them.

pub mod api;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod ops;
pub mod report;
pub mod settings;
pub mod signal;
pub mod ssh;

#[doc(inline)]
pub use dispatch::Dispatcher;
