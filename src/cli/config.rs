//! `get-panw-config`: prints the configuration of each firewall.

use super::{dispatch, piped_targets, resolve_targets, CommonArgs, Exit, KeyArgs, SshArgs};
use crate::api::ApiClient;
use crate::dispatch::OutputOrder;
use crate::ops::config::{ConfigSource, ConfigType, SetConfig, XmlConfig};
use crate::report::BannerRenderer;
use crate::settings::{Field, Terminal};
use crate::ssh::SshConnector;
use clap::{Args, ValueEnum};

/// How to retrieve and print the configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// XML over the API
    #[default]
    Xml,

    /// `set` commands over SSH
    Set,
}

/// Prints the configuration of each firewall (set/XML format)
#[derive(Args, Clone, Debug)]
pub struct ConfigArgs {
    /// Space separated list of firewalls to query
    pub hosts: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    pub format: Format,

    /// Configuration to retrieve (XML format)
    #[arg(short = 't', long = "type", value_enum, default_value_t)]
    pub config_type: ConfigType,

    /// XPath of the configuration to retrieve (XML format; overrides --type)
    #[arg(short = 'x', long)]
    pub xpath: Option<String>,

    #[command(flatten)]
    pub key: KeyArgs,

    #[command(flatten)]
    pub ssh: SshArgs,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl ConfigArgs {
    pub fn source(&self) -> ConfigSource {
        match &self.xpath {
            Some(xpath) => ConfigSource::XPath(xpath.clone()),
            None => ConfigSource::Type(self.config_type),
        }
    }
}

pub async fn run(args: ConfigArgs) -> anyhow::Result<Exit> {
    let fields = match args.format {
        Format::Xml => args.key.fields(&[Field::DefaultFirewall], args.common.update),
        Format::Set => vec![Field::DefaultFirewall, Field::DefaultUser],
    };
    let Some(settings) = args.common.settings(&fields, &mut Terminal)? else {
        return Ok(Exit::Success);
    };
    let (targets, _) =
        resolve_targets(piped_targets()?, &args.hosts, &settings.default_firewalls())?;

    match args.format {
        Format::Xml => {
            let key = args.key.resolve(&settings)?;
            let api = ApiClient::new(args.common.timeout())?;
            let operation = XmlConfig::new(api, key, args.source());
            let order = OutputOrder::Submission;
            dispatch(&args.common, order, targets, operation, BannerRenderer).await
        }
        Format::Set => {
            let options = args.ssh.options(&settings, args.common.timeout(), &mut Terminal)?;
            eprintln!("Connecting via SSH ...");
            let operation = SetConfig::new(SshConnector::new(options)?);
            let order = OutputOrder::Submission;
            dispatch(&args.common, order, targets, operation, BannerRenderer).await
        }
    }
}
