//! Lists the interfaces of each firewall with their link state and address.
//!
//! `show interface all` answers in two halves: `ifnet` holds logical interfaces with their
//! addresses, and `hw` holds physical ports with their link state. Rows are built from `ifnet`
//! and take their state from the `hw` entry of the same name.

use super::NOT_AVAILABLE;
use crate::api::{child_text, pretty, select, Query};
use crate::dispatch::{CancellationController, Operation, Outcome, Target};
use crate::error::HostError;
use crate::report::{failure_line, Line, Render};
use async_trait::async_trait;
use clap::ValueEnum;
use regex::Regex;
use roxmltree::Document;
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

const SHOW_INTERFACES: &str = "<show><interface>all</interface></show>";

/// A link state to filter rows by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LinkState {
    Up,
    Down,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkState::Up => f.write_str("up"),
            LinkState::Down => f.write_str("down"),
        }
    }
}

/// One logical interface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Interface {
    pub name: String,
    pub state: String,
    pub ip: String,
}

/// What one firewall returned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostInterfaces {
    /// Interfaces sorted by name.
    Rows(Vec<Interface>),

    /// The response itself, re-indented.
    Raw(String),
}

/// Queries each firewall for its interfaces.
#[derive(Clone, Debug)]
pub struct ShowInterfaces<Q> {
    api: Q,
    key: String,
    raw: bool,
}

impl<Q: Query> ShowInterfaces<Q> {
    pub fn new(api: Q, key: impl Into<String>) -> Self {
        ShowInterfaces {
            api,
            key: key.into(),
            raw: false,
        }
    }

    /// Yields the pretty-printed response instead of parsed interfaces.
    pub fn raw(mut self, raw: bool) -> Self {
        self.raw = raw;
        self
    }
}

#[async_trait]
impl<Q: Query> Operation for ShowInterfaces<Q> {
    type Payload = HostInterfaces;

    async fn run(
        &self,
        target: &Target,
        cancel: &CancellationController,
    ) -> anyhow::Result<HostInterfaces> {
        let params = [
            ("type", "op"),
            ("cmd", SHOW_INTERFACES),
            ("key", self.key.as_str()),
        ];
        let body = self.api.query(target, &params, cancel).await?;
        match self.raw {
            true => Ok(HostInterfaces::Raw(pretty(&body)?)),
            false => Ok(HostInterfaces::Rows(parse_interfaces(&body)?)),
        }
    }
}

/// Joins the logical and physical halves of a `show interface all` response.
pub fn parse_interfaces(body: &str) -> Result<Vec<Interface>, HostError> {
    let doc = Document::parse(body)?;

    let states: HashMap<_, _> = select(&doc, &["result", "hw", "entry"])
        .filter_map(|entry| {
            let name = child_text(entry, "name")?;
            Some((name, child_text(entry, "state").unwrap_or(NOT_AVAILABLE)))
        })
        .collect();

    let mut interfaces: Vec<_> = select(&doc, &["result", "ifnet", "entry"])
        .filter_map(|entry| {
            let name = child_text(entry, "name")?;
            Some(Interface {
                name: name.to_string(),
                state: states.get(name).copied().unwrap_or(NOT_AVAILABLE).to_string(),
                ip: child_text(entry, "ip").unwrap_or(NOT_AVAILABLE).to_string(),
            })
        })
        .collect();
    interfaces.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(interfaces)
}

/// Returns the first dotted-quad IPv4 address in `text`, e.g. `10.0.0.1` in `10.0.0.1/24`.
pub fn ipv4_address(text: &str) -> Option<&str> {
    static IPV4: OnceLock<Regex> = OnceLock::new();
    IPV4.get_or_init(|| {
        Regex::new(r"(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})").expect("IPv4 pattern should compile")
    })
    .find(text)
    .map(|m| m.as_str())
}

/// Prints interfaces as a tab-separated table, one row per interface.
#[derive(Clone, Debug, Default)]
pub struct InterfaceTable {
    state: Option<LinkState>,
    terse: bool,
}

impl InterfaceTable {
    /// With `terse`, prints only the IPv4 address of each interface that has one, and no header.
    pub fn new(state: Option<LinkState>, terse: bool) -> Self {
        InterfaceTable { state, terse }
    }

    fn admits(&self, interface: &Interface) -> bool {
        self.state
            .map_or(true, |state| interface.state == state.to_string())
    }

    fn row(&self, host: &Target, interface: &Interface) -> Option<Line> {
        if self.terse {
            return ipv4_address(&interface.ip).map(Line::out);
        }
        Some(Line::out(format!(
            "{:25}\t{:20}\t{:5}\t{:20}",
            host.as_str(),
            interface.name,
            interface.state,
            interface.ip
        )))
    }
}

impl Render<HostInterfaces> for InterfaceTable {
    fn header(&mut self) -> Vec<Line> {
        if self.terse {
            return Vec::new();
        }
        vec![
            Line::err(format!(
                "{:25}\t{:20}\t{:5}\t{:20}",
                "Firewall", "Interface", "State", "IpAddress"
            )),
            Line::err(format!(
                "{}\t{}\t{}\t{}",
                "=".repeat(25),
                "=".repeat(20),
                "=".repeat(5),
                "=".repeat(20)
            )),
        ]
    }

    fn render(&mut self, outcome: &Outcome<HostInterfaces>) -> Vec<Line> {
        match outcome {
            Outcome::Success {
                host,
                payload: HostInterfaces::Rows(interfaces),
            } => interfaces
                .iter()
                .filter(|interface| self.admits(interface))
                .filter_map(|interface| self.row(host, interface))
                .collect(),
            Outcome::Success {
                host,
                payload: HostInterfaces::Raw(xml),
            } => {
                let mut lines = crate::report::banner(host.as_str());
                lines.extend(xml.lines().map(Line::out));
                lines
            }
            Outcome::Failure(info) => vec![failure_line(info)],
        }
    }
}

#[cfg(test)]
mod test;
