//! Absolute base URL for CDN mode and origin checks.

use std::fmt;
use url::Url;

/// `scheme://host[:port]`, without a trailing slash.
///
/// The port is omitted when it is the default for the scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl {
    scheme: String,
    value: String,
}

impl BaseUrl {
    pub fn new(scheme: &str, host: &str, port: u16) -> Self {
        let scheme = scheme.to_ascii_lowercase();
        let host = host.trim_end_matches('/');
        let value = match default_port(&scheme) {
            Some(default) if default == port => format!("{scheme}://{host}"),
            _ => format!("{scheme}://{host}:{port}"),
        };
        Self { scheme, value }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Prepend the base to an absolute path (`/assets/app.js`).
    pub fn join(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.value)
        } else {
            format!("{}/{path}", self.value)
        }
    }

    /// Whether `url` is served from this origin.
    ///
    /// Protocol-relative URLs inherit this base's scheme. Anything that
    /// does not parse as an absolute URL is treated as same-origin.
    pub fn is_same_origin(&self, url: &str) -> bool {
        let candidate = if url.starts_with("//") {
            format!("{}:{url}", self.scheme)
        } else {
            url.to_owned()
        };
        match (Url::parse(&self.value), Url::parse(&candidate)) {
            (Ok(base), Ok(other)) => base.origin() == other.origin(),
            _ => true,
        }
    }
}

impl Default for BaseUrl {
    fn default() -> Self {
        Self::new("http", "localhost", 2300)
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    }
}
