//! Generates an API key on each firewall.

use clap::Parser;
use panw::cli;
use panw::cli::api_key::{self, ApiKeyArgs};
use std::process::ExitCode;

/// Generates an API key on each firewall
#[derive(Parser, Debug)]
#[command(name = "get-panw-api-key", version)]
struct Cli {
    #[command(flatten)]
    args: ApiKeyArgs,
}

#[tokio::main]
async fn main() -> ExitCode {
    let Cli { args } = Cli::parse();
    args.common.init_tracing();
    cli::exit(api_key::run(args).await)
}
