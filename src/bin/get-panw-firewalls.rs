//! Lists the firewalls managed by Panorama.

use clap::Parser;
use panw::cli;
use panw::cli::firewalls::{self, FirewallsArgs};
use std::process::ExitCode;

/// Lists the firewalls managed by Panorama
#[derive(Parser, Debug)]
#[command(name = "get-panw-firewalls", version)]
struct Cli {
    #[command(flatten)]
    args: FirewallsArgs,
}

#[tokio::main]
async fn main() -> ExitCode {
    let Cli { args } = Cli::parse();
    args.common.init_tracing();
    cli::exit(firewalls::run(args).await)
}
