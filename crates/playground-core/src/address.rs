//! Page addressing: sandbox selection, sub-path and derived addresses.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Sandbox used when the page path does not name one.
pub const DEFAULT_SANDBOX: &str = "ocaml";

/// Address error.
#[derive(Debug, Error)]
pub enum AddressError {
    #[error("Invalid address: {0}")]
    Parse(#[from] url::ParseError),
    #[error("Address has no host: {0}")]
    MissingHost(String),
}

/// Name of the sandboxed runtime a session connects to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SandboxId(String);

impl SandboxId {
    /// Create a sandbox identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SandboxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SandboxId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// The client's current page address.
///
/// Accessors follow the browser `location` conventions: `protocol` keeps the
/// trailing colon, `host` includes a non-default port, and `search` is either
/// empty or starts with `?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    url: Url,
}

impl Location {
    /// Parse a page address.
    ///
    /// # Errors
    /// Returns error if the address is not an absolute URL with a host.
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        let url = Url::parse(input)?;
        if url.host_str().is_none() {
            return Err(AddressError::MissingHost(input.to_string()));
        }
        Ok(Self { url })
    }

    /// Scheme with trailing colon, e.g. `https:`.
    #[must_use]
    pub fn protocol(&self) -> String {
        format!("{}:", self.url.scheme())
    }

    /// Whether the page was served over TLS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.url.scheme() == "https"
    }

    /// Host name without port.
    #[must_use]
    pub fn hostname(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// Host name plus explicit port, if any.
    #[must_use]
    pub fn host(&self) -> String {
        match self.url.port() {
            Some(port) => format!("{}:{port}", self.hostname()),
            None => self.hostname().to_string(),
        }
    }

    /// Path component, always starting with `/`.
    #[must_use]
    pub fn pathname(&self) -> &str {
        self.url.path()
    }

    /// Query string including the leading `?`, or empty.
    #[must_use]
    pub fn search(&self) -> String {
        match self.url.query() {
            Some(query) if !query.is_empty() => format!("?{query}"),
            _ => String::new(),
        }
    }

}

/// Sandbox and sub-path selected from the page path at session start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    sandbox: SandboxId,
    sub_path: String,
}

impl Address {
    /// Split a page path into sandbox and sub-path.
    ///
    /// The first segment names the sandbox (falling back to `default_sandbox`
    /// when absent or empty). Remaining segments are rejoined with `/` and
    /// prefixed with `/` when non-empty.
    #[must_use]
    pub fn from_path(path: &str, default_sandbox: &str) -> Self {
        let mut components = path.split('/').skip(1);

        let sandbox = components
            .next()
            .filter(|segment| !segment.is_empty())
            .unwrap_or(default_sandbox);

        let rest = components.collect::<Vec<_>>().join("/");
        let sub_path = if rest.is_empty() {
            rest
        } else {
            format!("/{rest}")
        };

        Self {
            sandbox: SandboxId::new(sandbox),
            sub_path,
        }
    }

    /// Address for the page's own location.
    #[must_use]
    pub fn from_location(location: &Location, default_sandbox: &str) -> Self {
        Self::from_path(location.pathname(), default_sandbox)
    }

    /// Sandbox selected at session start.
    #[must_use]
    pub fn sandbox(&self) -> &SandboxId {
        &self.sandbox
    }

    /// Routing context below the sandbox segment.
    #[must_use]
    pub fn sub_path(&self) -> &str {
        &self.sub_path
    }

    /// Backend socket address: `ws(s)://<host><socket_path>?sandbox=<id>`.
    ///
    /// A `socket_path` without a leading `/` is rooted.
    ///
    /// # Errors
    /// Returns error if the assembled address does not parse.
    pub fn socket_target(&self, location: &Location, socket_path: &str) -> Result<Url, AddressError> {
        let scheme = if location.is_secure() { "wss" } else { "ws" };
        let root = if socket_path.starts_with('/') { "" } else { "/" };
        let target = format!(
            "{scheme}://{}{root}{socket_path}?sandbox={}",
            location.host(),
            self.sandbox
        );
        Ok(Url::parse(&target)?)
    }

    /// Address of the started program: `<protocol>//<hostname>:<port><sub-path><search>`.
    #[must_use]
    pub fn frame_address(&self, location: &Location, port: u16) -> String {
        format!(
            "{}//{}:{port}{}{}",
            location.protocol(),
            location.hostname(),
            self.sub_path,
            location.search()
        )
    }

    /// Visible page address after a start: `/<sandbox><sub-path><search>`.
    #[must_use]
    pub fn visible_address(&self, sandbox: &str, location: &Location) -> String {
        format!("/{sandbox}{}{}", self.sub_path, location.search())
    }
}
