//! `get-panw-api-key`: generates an API key on each host.

use super::{dispatch, piped_targets, resolve_targets, CommonArgs, Exit, TargetSource};
use crate::api::ApiClient;
use crate::dispatch::OutputOrder;
use crate::ops::api_key::{GenerateKey, KeyRenderer};
use crate::settings::{Field, Prompt, Terminal};
use anyhow::{bail, Context};
use clap::Args;

/// Generates an API key on each host
#[derive(Args, Clone, Debug)]
pub struct ApiKeyArgs {
    /// Space separated list of hosts to query
    pub hosts: Vec<String>,

    /// User (defaults to the saved user)
    #[arg(short, long)]
    pub user: Option<String>,

    /// Password (prompted for if not given)
    #[arg(short, long)]
    pub password: Option<String>,

    #[command(flatten)]
    pub common: CommonArgs,
}

pub async fn run(args: ApiKeyArgs) -> anyhow::Result<Exit> {
    let mut prompt = Terminal;
    let fields = [Field::DefaultFirewall, Field::DefaultUser];
    let Some(settings) = args.common.settings(&fields, &mut prompt)? else {
        return Ok(Exit::Success);
    };

    let (targets, source) =
        resolve_targets(piped_targets()?, &args.hosts, &settings.default_firewalls())?;

    let user = match (args.user, source) {
        (Some(user), _) => user,
        (None, TargetSource::Stdin) => {
            bail!("a user (-u) is required when reading hosts from stdin")
        }
        (None, _) => settings
            .default_user
            .clone()
            .context("no user given and no default saved")?,
    };
    let password = match args.password {
        Some(password) => password,
        None => prompt.password(&format!("Password ({user})"))?,
    };

    // Keys from many hosts are indistinguishable without a label.
    let labelled = args.common.verbose > 0 || source == TargetSource::Stdin;
    let api = ApiClient::new(args.common.timeout())?;
    dispatch(
        &args.common,
        OutputOrder::Arrival,
        targets,
        GenerateKey::new(api, user, password),
        KeyRenderer::new(labelled),
    )
    .await
}
