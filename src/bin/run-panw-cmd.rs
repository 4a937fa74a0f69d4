//! Runs CLI commands on each firewall.

use clap::Parser;
use panw::cli;
use panw::cli::command::{self, CommandArgs};
use std::process::ExitCode;

/// Runs CLI commands on each firewall
#[derive(Parser, Debug)]
#[command(name = "run-panw-cmd", version)]
struct Cli {
    #[command(flatten)]
    args: CommandArgs,
}

#[tokio::main]
async fn main() -> ExitCode {
    let Cli { args } = Cli::parse();
    args.common.init_tracing();
    cli::exit(command::run(args).await)
}
