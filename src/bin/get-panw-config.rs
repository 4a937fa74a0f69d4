//! Prints the configuration of each firewall.

use clap::Parser;
use panw::cli;
use panw::cli::config::{self, ConfigArgs};
use std::process::ExitCode;

/// Prints the configuration of each firewall
#[derive(Parser, Debug)]
#[command(name = "get-panw-config", version)]
struct Cli {
    #[command(flatten)]
    args: ConfigArgs,
}

#[tokio::main]
async fn main() -> ExitCode {
    let Cli { args } = Cli::parse();
    args.common.init_tracing();
    cli::exit(config::run(args).await)
}
