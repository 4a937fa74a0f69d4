//! Lists the interfaces of each firewall.

use clap::Parser;
use panw::cli;
use panw::cli::interfaces::{self, InterfacesArgs};
use std::process::ExitCode;

/// Lists the interfaces of each firewall
#[derive(Parser, Debug)]
#[command(name = "get-panw-interfaces", version)]
struct Cli {
    #[command(flatten)]
    args: InterfacesArgs,
}

#[tokio::main]
async fn main() -> ExitCode {
    let Cli { args } = Cli::parse();
    args.common.init_tracing();
    cli::exit(interfaces::run(args).await)
}
