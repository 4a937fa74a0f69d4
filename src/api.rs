//! Talks to the XML API that firewalls and Panorama serve at `https://<host>/api/`.
//!
//! Every request is a `GET` with url-encoded query parameters, and every response is an XML
//! document rooted at `<response status="...">`. Appliances almost always present self-signed
//! certificates, so certificate and hostname verification are disabled.

use crate::dispatch::{CancellationController, Target};
use crate::error::HostError;
use async_trait::async_trait;
use roxmltree::{Document, Node};
use std::fmt::Write;
use std::time::Duration;
use tokio::select;
use tracing::debug;

/// An HTTPS client for the XML API. Cheap to clone and safe to share among workers.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
}

impl ApiClient {
    /// Creates a client whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true)
            .timeout(timeout)
            .build()?;
        Ok(ApiClient { http })
    }

    /// Returns the API endpoint for `host`.
    pub fn url(host: &Target) -> String {
        format!("https://{host}/api/")
    }
}

/// Sends queries to the API of a host. [ApiClient] is the production implementation.
#[async_trait]
pub trait Query: Send + Sync + 'static {
    /// Sends one query and returns the response body.
    ///
    /// Gives up early if `cancel` is tripped while the request is outstanding.
    ///
    /// # Errors
    ///
    /// Returns an error if the host can't be reached, answers with an HTTP error, or answers
    /// with a `status="error"` document.
    async fn query(
        &self,
        host: &Target,
        params: &[(&str, &str)],
        cancel: &CancellationController,
    ) -> Result<String, HostError>;
}

#[async_trait]
impl Query for ApiClient {
    async fn query(
        &self,
        host: &Target,
        params: &[(&str, &str)],
        cancel: &CancellationController,
    ) -> Result<String, HostError> {
        // Log parameter names only; some of the values are credentials.
        let names: Vec<_> = params.iter().map(|(name, _)| *name).collect();
        debug!(%host, params = ?names, "querying API");

        let request = async {
            let response = self
                .http
                .get(Self::url(host))
                .query(params)
                .send()
                .await?
                .error_for_status()?;
            Ok::<_, HostError>(response.text().await?)
        };

        let body = select! {
            _ = cancel.cancelled() => {
                return Err(HostError::Connect("request cancelled".to_string()));
            }
            body = request => body?,
        };

        check_status(&body)?;
        Ok(body)
    }
}

/// Fails if `body` isn't an XML document, or if it's an API error response.
///
/// Error responses carry their explanation in one or more `msg` elements, sometimes split
/// across nested `line` elements; all of that text is joined into the error.
pub fn check_status(body: &str) -> Result<(), HostError> {
    let doc = Document::parse(body)?;
    let root = doc.root_element();
    if root.attribute("status") != Some("error") {
        return Ok(());
    }

    let message = root
        .descendants()
        .filter(|n| n.has_tag_name("msg"))
        .flat_map(|msg| msg.descendants().filter(Node::is_text))
        .filter_map(|n| n.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    match message.is_empty() {
        true => Err(HostError::Api("request failed".to_string())),
        false => Err(HostError::Api(message)),
    }
}

/// Returns the trimmed text of the first child element of `node` named `name`, if that element
/// exists and has text.
pub fn child_text<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.children()
        .find(|n| n.has_tag_name(name))
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
}

/// Follows a path of element names down from the document's root element and returns every
/// element at the end of the path, in document order.
///
/// ```
/// let doc = roxmltree::Document::parse("<r><a><b>1</b><b>2</b></a></r>").unwrap();
/// let found: Vec<_> = panw::api::select(&doc, &["a", "b"]).map(|n| n.text().unwrap()).collect();
/// assert_eq!(vec!["1", "2"], found);
/// ```
pub fn select<'a, 'input>(
    doc: &'a Document<'input>,
    path: &[&str],
) -> impl Iterator<Item = Node<'a, 'input>> {
    let mut nodes = vec![doc.root_element()];
    for name in path {
        nodes = nodes
            .into_iter()
            .flat_map(|n| n.children().filter(|c| c.has_tag_name(*name)))
            .collect();
    }
    nodes.into_iter()
}

/// Re-indents an XML document with two spaces per level.
///
/// Whitespace-only text is dropped and all other text is trimmed. Elements whose only content is
/// text stay on one line.
pub fn pretty(body: &str) -> Result<String, HostError> {
    let doc = Document::parse(body)?;
    let mut out = String::new();
    write_node(&mut out, doc.root_element(), 0);
    Ok(out)
}

fn write_node(out: &mut String, node: Node, depth: usize) {
    let indent = "  ".repeat(depth);
    let name = node.tag_name().name();
    let _ = write!(out, "{indent}<{name}");
    for attr in node.attributes() {
        let _ = write!(out, " {}=\"{}\"", attr.name(), escape(attr.value()));
    }

    let children: Vec<_> = node
        .children()
        .filter(|c| {
            c.is_element() || (c.is_text() && c.text().is_some_and(|t| !t.trim().is_empty()))
        })
        .collect();

    match children.as_slice() {
        [] => out.push_str("/>\n"),
        [only] if only.is_text() => {
            let text = only.text().unwrap_or_default().trim();
            let _ = writeln!(out, ">{}</{name}>", escape(text));
        }
        _ => {
            out.push_str(">\n");
            for child in children.iter().copied() {
                if child.is_element() {
                    write_node(out, child, depth + 1);
                } else if let Some(text) = child.text() {
                    let _ = writeln!(out, "{indent}  {}", escape(text.trim()));
                }
            }
            let _ = writeln!(out, "{indent}</{name}>");
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
