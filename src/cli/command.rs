//! `run-panw-cmd`: runs CLI commands on each firewall.

use super::{dispatch, piped_targets, resolve_targets, CommonArgs, Exit, SshArgs};
use crate::dispatch::OutputOrder;
use crate::ops::command::RunCommands;
use crate::report::BannerRenderer;
use crate::settings::{Field, Terminal};
use crate::ssh::SshConnector;
use clap::Args;

/// Runs CLI commands on each firewall
#[derive(Args, Clone, Debug)]
pub struct CommandArgs {
    /// Space separated list of firewalls to query
    pub hosts: Vec<String>,

    /// CLI command to run (can be used multiple times)
    #[arg(short, long = "command", value_name = "COMMAND", required = true)]
    pub commands: Vec<String>,

    #[command(flatten)]
    pub ssh: SshArgs,

    #[command(flatten)]
    pub common: CommonArgs,
}

pub async fn run(args: CommandArgs) -> anyhow::Result<Exit> {
    let fields = [Field::DefaultFirewall, Field::DefaultUser];
    let Some(settings) = args.common.settings(&fields, &mut Terminal)? else {
        return Ok(Exit::Success);
    };
    let (targets, _) =
        resolve_targets(piped_targets()?, &args.hosts, &settings.default_firewalls())?;
    let options = args.ssh.options(&settings, args.common.timeout(), &mut Terminal)?;

    eprintln!("Connecting via SSH ...");
    dispatch(
        &args.common,
        OutputOrder::Submission,
        targets,
        RunCommands::new(SshConnector::new(options)?, args.commands),
        BannerRenderer,
    )
    .await
}
