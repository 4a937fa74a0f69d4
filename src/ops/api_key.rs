//! Generates an API key on each host from a user name and password.

use crate::api::Query;
use crate::dispatch::{CancellationController, Operation, Outcome, Target};
use crate::error::HostError;
use crate::report::{failure_line, Line, Render};
use async_trait::async_trait;
use roxmltree::Document;

/// Requests `type=keygen` and yields the key.
#[derive(Clone, Debug)]
pub struct GenerateKey<Q> {
    api: Q,
    user: String,
    password: String,
}

impl<Q: Query> GenerateKey<Q> {
    pub fn new(api: Q, user: impl Into<String>, password: impl Into<String>) -> Self {
        GenerateKey {
            api,
            user: user.into(),
            password: password.into(),
        }
    }
}

#[async_trait]
impl<Q: Query> Operation for GenerateKey<Q> {
    type Payload = String;

    async fn run(
        &self,
        target: &Target,
        cancel: &CancellationController,
    ) -> anyhow::Result<String> {
        let params = [
            ("type", "keygen"),
            ("user", self.user.as_str()),
            ("password", self.password.as_str()),
        ];
        let body = self.api.query(target, &params, cancel).await?;
        Ok(parse_key(&body)?)
    }
}

/// Returns the text of the first `key` element in a keygen response.
pub fn parse_key(body: &str) -> Result<String, HostError> {
    let doc = Document::parse(body)?;
    doc.descendants()
        .find(|n| n.has_tag_name("key"))
        .and_then(|n| n.text())
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .ok_or_else(|| HostError::Parse("no key element".to_string()))
}

/// Prints one key per line, optionally labelled with the host it came from.
#[derive(Clone, Debug, Default)]
pub struct KeyRenderer {
    labelled: bool,
}

impl KeyRenderer {
    /// With `labelled`, each key is preceded by `host: `, padded to 30 columns so keys line up.
    pub fn new(labelled: bool) -> Self {
        KeyRenderer { labelled }
    }
}

impl Render<String> for KeyRenderer {
    fn render(&mut self, outcome: &Outcome<String>) -> Vec<Line> {
        match outcome {
            Outcome::Success { host, payload } if self.labelled => {
                let label = format!("{host}: ");
                vec![Line::out(format!("{label:30}{payload}"))]
            }
            Outcome::Success { payload, .. } => vec![Line::out(payload.clone())],
            Outcome::Failure(info) => vec![failure_line(info)],
        }
    }
}
