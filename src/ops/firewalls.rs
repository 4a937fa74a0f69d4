//! Lists the firewalls that Panorama manages.
//!
//! Panorama reports every managed device under `result/devices/entry`. Devices that haven't
//! checked in for a while are often missing fields, which print as `n/a`. A device that was
//! re-added shows up once per registration, so entries are de-duplicated by serial number.

use super::NOT_AVAILABLE;
use crate::api::{child_text, pretty, select, Query};
use crate::dispatch::{CancellationController, Operation, Outcome, Target};
use crate::error::HostError;
use crate::report::{failure_line, Line, Render};
use async_trait::async_trait;
use clap::ValueEnum;
use indexmap::IndexMap;
use roxmltree::Document;

/// Which devices to list, by connection state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum DeviceState {
    Connected,
    Disconnected,
    NotConnected,
    Any,
    #[default]
    All,
}

impl DeviceState {
    /// The operational command that asks Panorama for devices in this state.
    pub fn command(self) -> &'static str {
        match self {
            DeviceState::Connected => "<show><devices><connected></connected></devices></show>",
            _ => "<show><devices><all></all></devices></show>",
        }
    }

    fn admits(self, connected: &str) -> bool {
        match self {
            DeviceState::Disconnected | DeviceState::NotConnected => connected != "yes",
            _ => true,
        }
    }
}

/// One managed device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Firewall {
    pub hostname: String,
    pub mgmt_ip: String,
    pub serial: String,
    pub model: String,
    pub connected: String,
    pub uptime: String,
    pub sw_version: String,
}

/// What one Panorama returned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Inventory {
    /// Parsed, filtered, and sorted devices.
    Devices(Vec<Firewall>),

    /// The response itself, re-indented.
    Raw(String),
}

/// Options that decide which devices are listed and how they're named.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeviceFilter {
    pub state: DeviceState,

    /// Appended to every hostname, e.g. `example.com` turns `FW-A` into `fw-a.example.com`.
    pub domain: Option<String>,

    /// Lists connected devices only.
    pub connected_only: bool,
}

/// Queries Panorama for its managed devices.
#[derive(Clone, Debug)]
pub struct ListFirewalls<Q> {
    api: Q,
    key: String,
    filter: DeviceFilter,
    raw: bool,
}

impl<Q: Query> ListFirewalls<Q> {
    pub fn new(api: Q, key: impl Into<String>, filter: DeviceFilter) -> Self {
        ListFirewalls {
            api,
            key: key.into(),
            filter,
            raw: false,
        }
    }

    /// Yields the pretty-printed response instead of parsed devices.
    pub fn raw(mut self, raw: bool) -> Self {
        self.raw = raw;
        self
    }
}

#[async_trait]
impl<Q: Query> Operation for ListFirewalls<Q> {
    type Payload = Inventory;

    async fn run(
        &self,
        target: &Target,
        cancel: &CancellationController,
    ) -> anyhow::Result<Inventory> {
        let params = [
            ("type", "op"),
            ("cmd", self.filter.state.command()),
            ("key", self.key.as_str()),
        ];
        let body = self.api.query(target, &params, cancel).await?;
        match self.raw {
            true => Ok(Inventory::Raw(pretty(&body)?)),
            false => Ok(Inventory::Devices(parse_devices(&body, &self.filter)?)),
        }
    }
}

/// Extracts the devices in a `show devices` response that pass `filter`.
///
/// Devices are sorted by hostname, with unnamed devices last. When several entries share a
/// serial number, the last one wins but keeps the first one's place.
pub fn parse_devices(body: &str, filter: &DeviceFilter) -> Result<Vec<Firewall>, HostError> {
    let doc = Document::parse(body)?;
    let mut by_serial = IndexMap::new();

    for entry in select(&doc, &["result", "devices", "entry"]) {
        let field = |name: &str| child_text(entry, name).unwrap_or(NOT_AVAILABLE).to_string();

        let connected = field("connected");
        if filter.connected_only && connected != "yes" {
            continue;
        }
        if !filter.state.admits(&connected) {
            continue;
        }

        let hostname = match child_text(entry, "hostname") {
            Some(name) => match &filter.domain {
                Some(domain) => format!("{}.{domain}", name.to_lowercase()),
                None => name.to_lowercase(),
            },
            None => NOT_AVAILABLE.to_string(),
        };

        let firewall = Firewall {
            hostname,
            mgmt_ip: field("ip-address"),
            serial: field("serial"),
            model: field("model"),
            connected,
            uptime: field("uptime"),
            sw_version: field("sw-version"),
        };
        by_serial.insert(firewall.serial.clone(), firewall);
    }

    let mut firewalls: Vec<_> = by_serial.into_values().collect();
    firewalls.sort_by(|a, b| {
        let a_key = (a.hostname == NOT_AVAILABLE, &a.hostname);
        let b_key = (b.hostname == NOT_AVAILABLE, &b.hostname);
        a_key.cmp(&b_key)
    });
    Ok(firewalls)
}

/// Prints devices as a tab-separated table that pastes cleanly into a spreadsheet.
///
/// The header goes to stderr so that piping the table elsewhere yields rows only.
#[derive(Clone, Debug, Default)]
pub struct FirewallTable {
    terse: bool,
}

impl FirewallTable {
    /// With `terse`, prints hostnames only and no header.
    pub fn new(terse: bool) -> Self {
        FirewallTable { terse }
    }

    fn row(&self, fw: &Firewall) -> Line {
        match self.terse {
            true => Line::out(fw.hostname.clone()),
            false => Line::out(format!(
                "{:30}\t{:15}\t{:12}\t{:8}\t{:9}\t{:20}\t{:9}",
                fw.hostname, fw.mgmt_ip, fw.serial, fw.model, fw.connected, fw.uptime, fw.sw_version
            )),
        }
    }
}

impl Render<Inventory> for FirewallTable {
    fn header(&mut self) -> Vec<Line> {
        if self.terse {
            return Vec::new();
        }
        let rule = |width| "=".repeat(width);
        vec![
            Line::err(format!(
                "{:30}\t{:15}\t{:12}\t{:8}\t{:9}\t{:20}\t{:9}",
                "Host", "MgmtIP", "Serial", "Model", "Connected", "Uptime", "SwVersion"
            )),
            Line::err(format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                rule(30),
                rule(15),
                rule(12),
                rule(8),
                rule(9),
                rule(20),
                rule(9)
            )),
        ]
    }

    fn render(&mut self, outcome: &Outcome<Inventory>) -> Vec<Line> {
        match outcome {
            Outcome::Success {
                payload: Inventory::Raw(xml),
                ..
            } => xml.lines().map(Line::out).collect(),
            Outcome::Success {
                payload: Inventory::Devices(firewalls),
                ..
            } => firewalls.iter().map(|fw| self.row(fw)).collect(),
            Outcome::Failure(info) => vec![failure_line(info)],
        }
    }
}

#[cfg(test)]
mod test;
