//! Outbound calls to the two upstream collaborators.
//!
//! The bridge talks to exactly two remote services per callback, strictly in
//! sequence: the originating Galaxy instance's webhook API (identity lookup)
//! and the NeLS portal API (transfer initiation). Both are plain
//! JSON-over-HTTP with no application-level protocol beyond that.
//!
//! [`UpstreamClient`] is the seam: the HTTP implementation is swapped for a
//! mock in integration tests.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::error::BridgeError;
use crate::transfer::{Action, TransferFields};

/// Default timeout for each outbound call.
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

/// Client for the two upstream services of a transfer callback.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Fetch the caller's identity from the Galaxy webhook API.
    ///
    /// All cookies of the inbound request are forwarded verbatim as the sole
    /// authentication mechanism; the webhook validates the session itself.
    async fn fetch_identity(
        &self,
        galaxy_root: &str,
        action: Action,
        cookie_header: &str,
    ) -> Result<Value, BridgeError>;

    /// POST the assembled field map to the NeLS portal to initiate the
    /// transfer. Any well-formed JSON object response counts as success; the
    /// portal gives no documented success flag to check.
    async fn submit_transfer(
        &self,
        api_url: &str,
        fields: &TransferFields,
    ) -> Result<Value, BridgeError>;
}

/// Reqwest-backed upstream client with bounded request timeouts.
#[derive(Debug, Clone)]
pub struct HttpUpstreamClient {
    client: reqwest::Client,
}

impl HttpUpstreamClient {
    /// Create a client with the given per-request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, BridgeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BridgeError::Transport {
                url: String::new(),
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }

    /// URL of the identity webhook for a given Galaxy root and action.
    pub fn identity_url(galaxy_root: &str, action: Action) -> String {
        format!(
            "{}/api/webhooks/{}/data",
            galaxy_root,
            action.webhook_name()
        )
    }

    async fn decode_json(url: &str, response: reqwest::Response) -> Result<Value, BridgeError> {
        let body = response
            .bytes()
            .await
            .map_err(|e| BridgeError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let value: Value =
            serde_json::from_slice(&body).map_err(|e| BridgeError::Decode {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        if !value.is_object() {
            return Err(BridgeError::Shape {
                url: url.to_string(),
            });
        }

        Ok(value)
    }
}

#[async_trait]
impl UpstreamClient for HttpUpstreamClient {
    async fn fetch_identity(
        &self,
        galaxy_root: &str,
        action: Action,
        cookie_header: &str,
    ) -> Result<Value, BridgeError> {
        let url = Self::identity_url(galaxy_root, action);
        debug!(url = %url, "Fetching identity from Galaxy webhook API");

        let mut request = self.client.get(&url);
        if !cookie_header.is_empty() {
            request = request.header(http::header::COOKIE, cookie_header);
        }

        let response = request.send().await.map_err(|e| BridgeError::Transport {
            url: url.clone(),
            message: e.to_string(),
        })?;

        Self::decode_json(&url, response).await
    }

    async fn submit_transfer(
        &self,
        api_url: &str,
        fields: &TransferFields,
    ) -> Result<Value, BridgeError> {
        debug!(url = %api_url, action = %fields.action, "Submitting transfer request to NeLS portal");

        let response = self
            .client
            .post(api_url)
            .form(&fields.to_form_pairs())
            .send()
            .await
            .map_err(|e| BridgeError::Transport {
                url: api_url.to_string(),
                message: e.to_string(),
            })?;

        Self::decode_json(api_url, response).await
    }
}

/// Re-serialize inbound cookies into a single `Cookie` header value in the
/// `k1=v1;k2=v2;...` form the Galaxy webhook API expects.
pub fn serialize_cookies<'a, I>(cookies: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut out = String::new();
    for (key, value) in cookies {
        out.push_str(key);
        out.push('=');
        out.push_str(value);
        out.push(';');
    }
    out
}

/// Parse the pairs of a `Cookie` request header.
///
/// Lenient: entries without an `=` are skipped, surrounding whitespace is
/// trimmed, values are kept opaque.
pub fn parse_cookie_header(header: &str) -> Vec<(&str, &str)> {
    header
        .split(';')
        .filter_map(|pair| {
            let pair = pair.trim();
            let (key, value) = pair.split_once('=')?;
            Some((key.trim(), value.trim()))
        })
        .collect()
}
