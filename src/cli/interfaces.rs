//! `get-panw-interfaces`: lists the interfaces of each firewall.

use super::{dispatch, piped_targets, resolve_targets, CommonArgs, Exit, KeyArgs};
use crate::api::ApiClient;
use crate::dispatch::OutputOrder;
use crate::ops::interfaces::{InterfaceTable, LinkState, ShowInterfaces};
use crate::settings::{Field, Terminal};
use clap::Args;

/// Lists the interfaces of each firewall
#[derive(Args, Clone, Debug)]
pub struct InterfacesArgs {
    /// Space separated list of firewalls to query
    pub hosts: Vec<String>,

    /// Only list interfaces in this link state
    #[arg(short = 's', long, value_enum)]
    pub if_state: Option<LinkState>,

    /// Print IP addresses only
    #[arg(short, long)]
    pub terse: bool,

    /// Print the raw XML response of each firewall
    #[arg(short, long, conflicts_with = "terse")]
    pub raw: bool,

    #[command(flatten)]
    pub key: KeyArgs,

    #[command(flatten)]
    pub common: CommonArgs,
}

pub async fn run(args: InterfacesArgs) -> anyhow::Result<Exit> {
    let fields = args.key.fields(&[Field::DefaultFirewall], args.common.update);
    let Some(settings) = args.common.settings(&fields, &mut Terminal)? else {
        return Ok(Exit::Success);
    };
    let key = args.key.resolve(&settings)?;
    let (targets, _) =
        resolve_targets(piped_targets()?, &args.hosts, &settings.default_firewalls())?;

    let api = ApiClient::new(args.common.timeout())?;
    dispatch(
        &args.common,
        OutputOrder::Submission,
        targets,
        ShowInterfaces::new(api, key).raw(args.raw),
        InterfaceTable::new(args.if_state, args.terse || args.raw),
    )
    .await
}
