//! Pieces shared by the command-line tools.
//!
//! Each tool follows the same steps:
//!
//! 1. Parse arguments ([CommonArgs] plus its own) and set up logging.
//!
//! 2. Load the settings file, asking for anything the tool needs that isn't saved yet. With
//!    `--update`, ask for new values instead, save them, and stop.
//!
//! 3. Work out which hosts to contact (see [resolve_targets]).
//!
//! 4. Run an [Operation] against the hosts with [dispatch], which prints the results as they
//!    come in and summarizes failures on stderr.
//!
//! 5. Exit with a status that reflects how the run went (see [Exit]).

use crate::dispatch::{
    Dispatcher, Operation, OutputOrder, RunStatus, RunSummary, TargetSet, DEFAULT_CONCURRENCY,
};
use crate::report::{Console, Render};
use crate::settings::{Field, Prompt, Settings, SettingsFile};
use crate::signal;
use crate::ssh::{Password, SshOptions};
use anyhow::{bail, Context};
use clap::{ArgAction, Args};
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

pub mod api_key;
pub mod command;
pub mod config;
pub mod firewalls;
pub mod interfaces;

/// The exit status for errors that stop a tool before or during a run.
pub const FATAL: u8 = 2;

/// Options every tool accepts.
#[derive(Args, Clone, Debug)]
pub struct CommonArgs {
    /// Update saved settings
    #[arg(short = 'U', long)]
    pub update: bool,

    /// Verbosity level (use -v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Number of hosts to contact at once
    #[arg(short = 'j', long, value_name = "N", default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Seconds to wait for each host
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub timeout: u64,
}

impl CommonArgs {
    /// Sends log messages to stderr. `RUST_LOG` overrides the level chosen with `-v`.
    pub fn init_tracing(&self) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let directive = match self.verbose {
                0 => "warn",
                1 => "panw=info",
                2 => "panw=debug",
                _ => "trace",
            };
            EnvFilter::new(directive)
        });

        fmt()
            .without_time()
            .with_env_filter(filter)
            .with_target(self.verbose != 0)
            .with_writer(io::stderr)
            .init();
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Loads the settings file, asking for any of `fields` that are missing.
    ///
    /// With `--update`, asks for a new value for each of `fields` instead, saves them, and returns
    /// [None]: the tool has nothing left to do.
    pub fn settings(
        &self,
        fields: &[Field],
        prompt: &mut impl Prompt,
    ) -> anyhow::Result<Option<Settings>> {
        let file = SettingsFile::new(crate::config::settings_path()?);
        debug!(path = %file.path().display(), "loading settings");

        if self.update {
            eprintln!("\nUpdating saved settings ...\n");
            file.update(fields, prompt)?;
            println!("\nSettings updated!");
            return Ok(None);
        }
        file.ensure(fields, prompt).map(Some)
    }
}

/// The API key option of the tools that use the XML API.
#[derive(Args, Clone, Debug, Default)]
pub struct KeyArgs {
    /// API key (defaults to the saved key)
    #[arg(short, long)]
    pub key: Option<String>,
}

impl KeyArgs {
    /// The settings a tool needs: `base`, plus the saved key unless one was given. `--update`
    /// always asks for the key.
    pub fn fields(&self, base: &[Field], update: bool) -> Vec<Field> {
        let mut fields = base.to_vec();
        if self.key.is_none() || update {
            fields.push(Field::Key);
        }
        fields
    }

    /// The key to use: the one given on the command line, else the saved one.
    pub fn resolve(&self, settings: &Settings) -> anyhow::Result<String> {
        self.key
            .clone()
            .or_else(|| settings.key.clone())
            .context("no API key saved; run get-panw-api-key and save its output with --update")
    }
}

/// Options for the tools that log in over SSH.
#[derive(Args, Clone, Debug, Default)]
pub struct SshArgs {
    /// User (defaults to the saved user)
    #[arg(short, long)]
    pub user: Option<String>,

    /// Password (asked for when neither this nor -K is given)
    #[arg(short, long, conflicts_with = "key_based_auth")]
    pub password: Option<String>,

    /// Use key based authentication
    #[arg(short = 'K', long)]
    pub key_based_auth: bool,

    /// Private key for key based authentication (defaults to ~/.ssh/id_rsa)
    #[arg(short, long, value_name = "FILE", requires = "key_based_auth")]
    pub identity: Option<PathBuf>,
}

impl SshArgs {
    /// Combines these options with the saved settings, asking for a password unless one was
    /// given or keys are used.
    pub fn options(
        &self,
        settings: &Settings,
        timeout: Duration,
        prompt: &mut impl Prompt,
    ) -> anyhow::Result<SshOptions> {
        let user = self.user.clone().or_else(|| settings.default_user.clone());
        let identity = match (self.key_based_auth, &self.identity) {
            (false, _) => None,
            (true, Some(identity)) => Some(identity.clone()),
            (true, None) => Some(crate::config::default_key_path()?),
        };
        let password = match (self.key_based_auth, &self.password) {
            (true, _) => None,
            (false, Some(password)) if !password.is_empty() => Some(password.clone()),
            (false, _) => {
                let label = match &user {
                    Some(user) => format!("Password ({user})"),
                    None => "Password".to_string(),
                };
                Some(prompt.password(&label)?)
            }
        };
        Ok(SshOptions {
            user,
            identity,
            password: password.map(Password::new),
            timeout,
        })
    }
}

/// Where the hosts for a run came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetSource {
    Stdin,
    Args,
    Saved,
}

/// Reads hosts from stdin, one per line, unless stdin is a terminal.
pub fn piped_targets() -> anyhow::Result<Option<TargetSet>> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }
    let targets = TargetSet::from_lines(stdin.lock()).context("unable to read hosts from stdin")?;
    Ok(Some(targets))
}

/// Picks the hosts for a run: those piped to stdin if there are any, then those named on the
/// command line, then the saved defaults.
///
/// # Errors
///
/// Returns an error if all three are empty.
pub fn resolve_targets(
    piped: Option<TargetSet>,
    args: &[String],
    saved: &[String],
) -> anyhow::Result<(TargetSet, TargetSource)> {
    if let Some(targets) = piped.filter(|targets| !targets.is_empty()) {
        return Ok((targets, TargetSource::Stdin));
    }
    if !args.is_empty() {
        return Ok((TargetSet::new(args.iter().cloned()), TargetSource::Args));
    }
    if !saved.is_empty() {
        return Ok((TargetSet::new(saved.iter().cloned()), TargetSource::Saved));
    }
    bail!("no hosts given and no default saved; name some hosts or run with --update")
}

/// How a tool's run turned out, as far as the exit status is concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Exit {
    /// Every host succeeded, or at least one did.
    Success,

    /// There were hosts, and every one of them failed.
    AllFailed,

    /// The user interrupted the run.
    Interrupted,
}

impl Exit {
    pub fn code(self) -> u8 {
        match self {
            Exit::Success => 0,
            Exit::AllFailed => 1,
            Exit::Interrupted => signal::INTERRUPTED as u8,
        }
    }
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        ExitCode::from(exit.code())
    }
}

/// Writes a one-line account of any failures or cancellation to `err`, and decides the exit
/// status.
pub fn summarize(summary: &RunSummary, err: &mut impl Write) -> io::Result<Exit> {
    match summary.status {
        RunStatus::Succeeded => Ok(Exit::Success),
        RunStatus::HostsFailed => {
            writeln!(err, "{} of {} hosts failed", summary.failed, summary.submitted)?;
            match summary.all_failed() {
                true => Ok(Exit::AllFailed),
                false => Ok(Exit::Success),
            }
        }
        RunStatus::Cancelled => {
            writeln!(
                err,
                "cancelled: {} completed, {} abandoned",
                summary.completed, summary.abandoned
            )?;
            Ok(Exit::Interrupted)
        }
    }
}

/// Runs `operation` against `targets`, printing to the real stdout and stderr, and cancelling on
/// interrupt.
pub async fn dispatch<O, R>(
    common: &CommonArgs,
    order: OutputOrder,
    targets: TargetSet,
    operation: O,
    renderer: R,
) -> anyhow::Result<Exit>
where
    O: Operation,
    R: Render<O::Payload> + 'static,
{
    let dispatcher = Dispatcher::new(common.concurrency)?.with_order(order);
    let signals = signal::cancel_on_signal(dispatcher.cancellation().clone());
    let report = dispatcher
        .run(targets, Arc::new(operation), renderer, Console::stdio())
        .await;
    signals.abort();

    let summary = report?.summary;
    Ok(summarize(&summary, &mut io::stderr().lock())?)
}

/// Converts the result of a tool into its exit status, printing any error first.
pub fn exit(result: anyhow::Result<Exit>) -> ExitCode {
    match result {
        Ok(exit) => exit.into(),
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(FATAL)
        }
    }
}
