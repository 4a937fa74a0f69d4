//! Front end for all of the tools: `panw-utils <command> [options]`.

use clap::{Parser, Subcommand};
use panw::cli::api_key::{self, ApiKeyArgs};
use panw::cli::command::{self, CommandArgs};
use panw::cli::config::{self, ConfigArgs};
use panw::cli::firewalls::{self, FirewallsArgs};
use panw::cli::interfaces::{self, InterfacesArgs};
use panw::cli::{self, CommonArgs};
use std::process::ExitCode;

/// Utilities for Palo Alto Networks firewalls and Panorama
#[derive(Parser, Debug)]
#[command(name = "panw-utils", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generates an API key on each firewall
    ApiKey(ApiKeyArgs),

    /// Lists the firewalls managed by Panorama
    Firewalls(FirewallsArgs),

    /// Lists the interfaces of each firewall
    Interfaces(InterfacesArgs),

    /// Prints the configuration of each firewall
    Config(ConfigArgs),

    /// Runs CLI commands on each firewall
    #[command(alias = "exec")]
    Run(CommandArgs),
}

impl Command {
    fn common(&self) -> &CommonArgs {
        match self {
            Command::ApiKey(args) => &args.common,
            Command::Firewalls(args) => &args.common,
            Command::Interfaces(args) => &args.common,
            Command::Config(args) => &args.common,
            Command::Run(args) => &args.common,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let Cli { command: tool } = Cli::parse();
    tool.common().init_tracing();

    let result = match tool {
        Command::ApiKey(args) => api_key::run(args).await,
        Command::Firewalls(args) => firewalls::run(args).await,
        Command::Interfaces(args) => interfaces::run(args).await,
        Command::Config(args) => config::run(args).await,
        Command::Run(args) => command::run(args).await,
    };
    cli::exit(result)
}
