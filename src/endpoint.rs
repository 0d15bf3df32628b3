use std::fmt;

use url::Url;

use crate::{Result, SessionError};

/// Target host that outbound requests are sent to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Endpoint {
    scheme: String,
    host: String,
    port: u16,
}

impl Endpoint {
    /// HTTPS on port 443, the controller's default.
    pub fn https(host: impl Into<String>) -> Self {
        Self {
            scheme: "https".to_owned(),
            host: host.into(),
            port: 443,
        }
    }

    /// Parses `scheme://host[:port]`; a bare host is treated as HTTPS.
    ///
    /// Any path, query or fragment in `input` is ignored.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(SessionError::InvalidRequest("endpoint is empty".to_owned()));
        }
        let candidate = if trimmed.contains("://") {
            trimmed.to_owned()
        } else {
            format!("https://{trimmed}")
        };
        let url = Url::parse(&candidate).map_err(|err| {
            SessionError::InvalidRequest(format!("invalid endpoint '{input}': {err}"))
        })?;
        Self::from_url(&url).ok_or_else(|| {
            SessionError::InvalidRequest(format!("endpoint '{input}' has no host"))
        })
    }

    /// Resolves a `Location` header value against this endpoint.
    ///
    /// Absolute locations replace scheme, host and port; relative ones keep
    /// the current endpoint.
    pub fn resolve_location(&self, location: &str) -> Option<Self> {
        let base = Url::parse(&self.base_url()).ok()?;
        let target = base.join(location.trim()).ok()?;
        Self::from_url(&target)
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `scheme://host:port` with no trailing slash.
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }

    fn from_url(url: &Url) -> Option<Self> {
        let host = url.host_str().filter(|host| !host.is_empty())?;
        let port = url.port_or_known_default()?;
        Some(Self {
            scheme: url.scheme().to_owned(),
            host: host.to_owned(),
            port,
        })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base_url())
    }
}
