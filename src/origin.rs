//! Origin URL reconstruction.
//!
//! The callback page is served from the Galaxy instance's static asset tree,
//! so the Galaxy root URL is recovered from the inbound request itself:
//! rebuild the absolute request URL from connection metadata, then split on
//! the `/static/` path segment. Everything before the marker is the platform
//! root, which is used both to reach the webhook API and as the final
//! redirect target.

/// Path segment separating the Galaxy root from its static asset tree.
pub const STATIC_MARKER: &str = "/static/";

/// Default port for plain HTTP, omitted from reconstructed URLs.
const HTTP_DEFAULT_PORT: u16 = 80;

/// Default port for HTTPS, omitted from reconstructed URLs.
const HTTPS_DEFAULT_PORT: u16 = 443;

/// Immutable snapshot of the connection metadata needed to rebuild the
/// absolute URL of the current request.
#[derive(Debug, Clone)]
pub struct OriginParts {
    /// Whether the connection is TLS-terminated (directly or at a proxy)
    pub tls: bool,

    /// Protocol string from the request line, e.g. `HTTP/1.1`
    pub protocol: String,

    /// `Host` header value, if present (may include a port)
    pub host_header: Option<String>,

    /// `X-Forwarded-Host` header value, if present
    pub forwarded_host: Option<String>,

    /// Server name fallback when no host header is available
    pub server_name: String,

    /// Port the server is listening on (fallback path only)
    pub server_port: u16,

    /// Path and query of the current request, e.g. `/static/callback?action=import`
    pub request_uri: String,
}

impl OriginParts {
    /// Reconstruct the scheme from the protocol string and the TLS flag.
    ///
    /// `HTTP/1.1` yields `http`, with an `s` appended when TLS is on.
    fn scheme(&self) -> String {
        let name = self
            .protocol
            .split('/')
            .next()
            .unwrap_or("http")
            .to_lowercase();
        if self.tls {
            format!("{}s", name)
        } else {
            name
        }
    }

    /// Port suffix for the server-name fallback, empty when the port is the
    /// default for the scheme.
    fn port_suffix(&self) -> String {
        let default = if self.tls {
            HTTPS_DEFAULT_PORT
        } else {
            HTTP_DEFAULT_PORT
        };
        if self.server_port == default {
            String::new()
        } else {
            format!(":{}", self.server_port)
        }
    }

    /// Rebuild the absolute URL of the current request.
    ///
    /// The forwarded host is honored only when `use_forwarded_host` is set;
    /// otherwise the `Host` header wins, with a server-name + port fallback
    /// when neither header is present.
    pub fn full_url(&self, use_forwarded_host: bool) -> String {
        let host = if use_forwarded_host && self.forwarded_host.is_some() {
            self.forwarded_host.clone()
        } else {
            self.host_header.clone()
        };

        let host = host.unwrap_or_else(|| format!("{}{}", self.server_name, self.port_suffix()));

        format!("{}://{}{}", self.scheme(), host, self.request_uri)
    }

    /// Derive the Galaxy root URL for the current request.
    pub fn origin_root(&self, use_forwarded_host: bool) -> String {
        origin_root_of(&self.full_url(use_forwarded_host))
    }
}

/// Split an absolute request URL on the static-asset marker to obtain the
/// platform root. A URL without the marker is returned unchanged.
pub fn origin_root_of(url: &str) -> String {
    match url.split_once(STATIC_MARKER) {
        Some((root, _)) => root.to_string(),
        None => url.to_string(),
    }
}
