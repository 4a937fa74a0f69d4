//! Saved defaults shared by all of the tools: which hosts to talk to, as whom, and with which API
//! key.
//!
//! Settings live in one JSON file (see [settings_path]). A tool that needs a setting the file
//! doesn't have asks for it and saves the answer, so the first run of any tool bootstraps the
//! file. The file holds an API key, so it's created readable by its owner only.
//!
//! [settings_path]: crate::config::settings_path

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

/// The contents of the settings file.
///
/// Fields this version doesn't know about are kept and written back unchanged.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_firewall: Option<Hosts>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_panorama: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_user: Option<String>,

    /// An API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// One host, or a list of them. Older files store a single string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Hosts {
    One(String),
    Many(Vec<String>),
}

impl Hosts {
    /// Parses user input: hosts separated by commas and/or whitespace.
    pub fn parse(input: &str) -> Option<Self> {
        let mut hosts: Vec<_> = input
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|host| !host.is_empty())
            .map(str::to_string)
            .collect();
        match hosts.len() {
            0 => None,
            1 => hosts.pop().map(Hosts::One),
            _ => Some(Hosts::Many(hosts)),
        }
    }

    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Hosts::One(host) => vec![host.clone()],
            Hosts::Many(hosts) => hosts.clone(),
        }
    }
}

impl fmt::Display for Hosts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_vec().join(" "))
    }
}

/// A setting that can be prompted for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    DefaultFirewall,
    DefaultPanorama,
    DefaultUser,
    Key,
}

impl Field {
    pub fn label(self) -> &'static str {
        match self {
            Field::DefaultFirewall => "Default Firewall",
            Field::DefaultPanorama => "Default Panorama",
            Field::DefaultUser => "Default User",
            Field::Key => "API Key",
        }
    }
}

impl Settings {
    /// Returns the value of `field` as text, if it's set.
    pub fn get(&self, field: Field) -> Option<String> {
        match field {
            Field::DefaultFirewall => self.default_firewall.as_ref().map(Hosts::to_string),
            Field::DefaultPanorama => self.default_panorama.clone(),
            Field::DefaultUser => self.default_user.clone(),
            Field::Key => self.key.clone(),
        }
    }

    /// Sets `field` from text. Empty text clears the field.
    pub fn set(&mut self, field: Field, value: &str) {
        let value = value.trim();
        let text = (!value.is_empty()).then(|| value.to_string());
        match field {
            Field::DefaultFirewall => self.default_firewall = Hosts::parse(value),
            Field::DefaultPanorama => self.default_panorama = text,
            Field::DefaultUser => self.default_user = text,
            Field::Key => self.key = text,
        }
    }

    /// The saved firewalls, in the order they were entered.
    pub fn default_firewalls(&self) -> Vec<String> {
        self.default_firewall
            .as_ref()
            .map(Hosts::to_vec)
            .unwrap_or_default()
    }

    /// Serializes to pretty JSON with two-space indentation and keys in alphabetical order.
    pub fn to_json(&self) -> anyhow::Result<String> {
        // serde_json's Map is a BTreeMap, so going through Value sorts the keys.
        let value = serde_json::to_value(self)?;
        let mut json = serde_json::to_string_pretty(&value)?;
        json.push('\n');
        Ok(json)
    }
}

/// Asks the user for values.
pub trait Prompt {
    /// Asks for a line of text. If the user enters nothing, returns `default` when there is one.
    fn input(&mut self, label: &str, default: Option<&str>) -> anyhow::Result<String>;

    /// Asks for a secret without echoing it.
    fn password(&mut self, label: &str) -> anyhow::Result<String>;
}

/// Production implementation of [Prompt]. Prompts on the terminal.
#[derive(Clone, Debug, Default)]
pub struct Terminal;

impl Prompt for Terminal {
    fn input(&mut self, label: &str, default: Option<&str>) -> anyhow::Result<String> {
        let mut input = dialoguer::Input::<String>::new()
            .with_prompt(label)
            .allow_empty(true);
        if let Some(default) = default {
            input = input.default(default.to_string());
        }
        Ok(input.interact_text()?)
    }

    fn password(&mut self, label: &str) -> anyhow::Result<String> {
        Ok(dialoguer::Password::new().with_prompt(label).interact()?)
    }
}

/// The settings file on disk.
#[derive(Clone, Debug)]
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SettingsFile { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the settings, or returns [None] if the file doesn't exist yet.
    pub fn load(&self) -> anyhow::Result<Option<Settings>> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("unable to read {}", self.path.display()))
            }
        };
        let settings = serde_json::from_str(&json)
            .with_context(|| format!("{} is not a valid settings file", self.path.display()))?;
        Ok(Some(settings))
    }

    /// Writes `settings`, replacing the file if it exists. The file ends up readable and writable
    /// by its owner only.
    pub fn save(&self, settings: &Settings) -> anyhow::Result<()> {
        let json = settings.to_json()?;
        let context = || format!("unable to write {}", self.path.display());

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&self.path).with_context(context)?;
        file.write_all(json.as_bytes()).with_context(context)?;

        // `mode` only applies when the file is created.
        #[cfg(unix)]
        fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))
            .with_context(context)?;

        debug!(path = %self.path.display(), "saved settings");
        Ok(())
    }

    /// Loads the settings, asking for any of `required` that are missing and saving the answers.
    pub fn ensure(
        &self,
        required: &[Field],
        prompt: &mut impl Prompt,
    ) -> anyhow::Result<Settings> {
        let loaded = self.load()?;
        let created = loaded.is_none();
        let mut settings = loaded.unwrap_or_default();

        let mut changed = false;
        for &field in required {
            if settings.get(field).is_none() {
                let answer = prompt.input(field.label(), None)?;
                settings.set(field, &answer);
                changed = true;
            }
        }

        if created || changed {
            self.save(&settings)?;
        }
        Ok(settings)
    }

    /// Asks for a new value for each of `fields`, offering the current value as the default, and
    /// saves the result.
    pub fn update(&self, fields: &[Field], prompt: &mut impl Prompt) -> anyhow::Result<Settings> {
        let mut settings = self.load()?.unwrap_or_default();
        for &field in fields {
            let current = settings.get(field);
            let label = format!("New {}", field.label());
            let answer = prompt.input(&label, current.as_deref())?;
            settings.set(field, &answer);
        }
        self.save(&settings)?;
        Ok(settings)
    }
}
