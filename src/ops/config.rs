//! Retrieves each firewall's configuration, as XML over the API or as `set` commands over SSH.

use super::{cancellable, close_session};
use crate::api::{pretty, Query};
use crate::dispatch::{CancellationController, Operation, Target};
use crate::ssh::{self, Connect, Shell};
use async_trait::async_trait;
use clap::ValueEnum;
use std::fmt;

/// The commands that make the CLI print the configuration as `set` commands.
pub const SET_FORMAT_SCRIPT: [&str; 3] =
    ["set cli config-output-format set", "configure", "show"];

/// Lines of login banner and prompts before the configuration, and of prompts after it.
const TRANSCRIPT_HEAD: usize = 4;
const TRANSCRIPT_TAIL: usize = 4;

/// The configurations a firewall can show over the API.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ConfigType {
    #[default]
    Running,
    Candidate,
    PushedTemplate,
    PushedSharedPolicy,
    Merged,
    Synced,
    SyncedDiff,
}

impl fmt::Display for ConfigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConfigType::Running => "running",
            ConfigType::Candidate => "candidate",
            ConfigType::PushedTemplate => "pushed-template",
            ConfigType::PushedSharedPolicy => "pushed-shared-policy",
            ConfigType::Merged => "merged",
            ConfigType::Synced => "synced",
            ConfigType::SyncedDiff => "synced-diff",
        };
        f.write_str(name)
    }
}

/// Which part of the configuration to retrieve over the API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigSource {
    /// The whole configuration of a type.
    Type(ConfigType),

    /// The running configuration beneath an XPath.
    XPath(String),
}

impl ConfigSource {
    /// Returns the query parameters, minus the key, that retrieve this configuration.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        match self {
            ConfigSource::Type(config_type) => vec![
                ("type", "op".to_string()),
                (
                    "cmd",
                    format!("<show><config><{config_type}></{config_type}></config></show>"),
                ),
            ],
            ConfigSource::XPath(xpath) => vec![
                ("type", "config".to_string()),
                ("action", "show".to_string()),
                ("xpath", xpath.clone()),
            ],
        }
    }
}

impl From<ConfigType> for ConfigSource {
    fn from(config_type: ConfigType) -> Self {
        ConfigSource::Type(config_type)
    }
}

/// Retrieves the configuration as XML over the API.
#[derive(Clone, Debug)]
pub struct XmlConfig<Q> {
    api: Q,
    key: String,
    source: ConfigSource,
}

impl<Q: Query> XmlConfig<Q> {
    pub fn new(api: Q, key: impl Into<String>, source: ConfigSource) -> Self {
        XmlConfig {
            api,
            key: key.into(),
            source,
        }
    }
}

#[async_trait]
impl<Q: Query> Operation for XmlConfig<Q> {
    type Payload = String;

    async fn run(
        &self,
        target: &Target,
        cancel: &CancellationController,
    ) -> anyhow::Result<String> {
        let owned = self.source.params();
        let mut params: Vec<_> = owned
            .iter()
            .map(|(name, value)| (*name, value.as_str()))
            .collect();
        params.push(("key", self.key.as_str()));

        let body = self.api.query(target, &params, cancel).await?;
        Ok(pretty(&body)?)
    }
}

/// Retrieves the configuration as `set` commands over SSH.
#[derive(Clone, Debug)]
pub struct SetConfig<C> {
    connector: C,
}

impl<C: Connect> SetConfig<C> {
    pub fn new(connector: C) -> Self {
        SetConfig { connector }
    }
}

#[async_trait]
impl<C: Connect> Operation for SetConfig<C> {
    type Payload = String;

    async fn run(
        &self,
        target: &Target,
        cancel: &CancellationController,
    ) -> anyhow::Result<String> {
        let mut shell = self.connector.connect(target).await?;
        let transcript = cancellable(cancel, shell.script(&SET_FORMAT_SCRIPT)).await;
        close_session(target, shell).await;
        Ok(strip_transcript(&transcript?))
    }
}

/// Removes the prompts surrounding the configuration in a shell transcript.
pub fn strip_transcript(transcript: &str) -> String {
    ssh::trim_lines(transcript, TRANSCRIPT_HEAD, TRANSCRIPT_TAIL)
}

#[cfg(test)]
mod test;
