//! `get-panw-firewalls`: lists the firewalls managed by Panorama.

use super::{dispatch, resolve_targets, CommonArgs, Exit, KeyArgs};
use crate::api::ApiClient;
use crate::dispatch::OutputOrder;
use crate::ops::firewalls::{DeviceFilter, DeviceState, FirewallTable, ListFirewalls};
use crate::settings::{Field, Terminal};
use clap::Args;

/// Lists the firewalls managed by Panorama
#[derive(Args, Clone, Debug)]
pub struct FirewallsArgs {
    /// Panorama to query (defaults to the saved Panorama)
    pub panorama: Option<String>,

    /// Devices to list, by connection state
    #[arg(short, long, value_enum, default_value_t = DeviceState::All)]
    pub state: DeviceState,

    /// Domain to append to each hostname
    #[arg(short, long)]
    pub domain: Option<String>,

    /// Print the hostnames of connected firewalls only
    #[arg(short, long)]
    pub terse: bool,

    /// Print the raw XML response
    #[arg(short, long, conflicts_with = "terse")]
    pub raw: bool,

    #[command(flatten)]
    pub key: KeyArgs,

    #[command(flatten)]
    pub common: CommonArgs,
}

pub async fn run(args: FirewallsArgs) -> anyhow::Result<Exit> {
    let fields = args.key.fields(&[Field::DefaultPanorama], args.common.update);
    let Some(settings) = args.common.settings(&fields, &mut Terminal)? else {
        return Ok(Exit::Success);
    };
    let key = args.key.resolve(&settings)?;

    let named: Vec<_> = args.panorama.into_iter().collect();
    let saved: Vec<_> = settings.default_panorama.clone().into_iter().collect();
    let (targets, _) = resolve_targets(None, &named, &saved)?;

    let filter = DeviceFilter {
        state: args.state,
        domain: args.domain,
        connected_only: args.terse,
    };
    let api = ApiClient::new(args.common.timeout())?;
    dispatch(
        &args.common,
        OutputOrder::Submission,
        targets,
        ListFirewalls::new(api, key, filter).raw(args.raw),
        FirewallTable::new(args.terse || args.raw),
    )
    .await
}
