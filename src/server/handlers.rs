//! HTTP request handlers for the transfer callback bridge.
//!
//! # Endpoints
//!
//! - `POST /static/history_transfer_callback` - Transfer callback
//! - `GET /health` - Health check endpoint
//!
//! The callback flow is strictly sequential: validate the two request
//! parameters, resolve the Galaxy origin from request metadata, fetch the
//! caller's identity from the Galaxy webhook API with forwarded cookies,
//! build the transfer field map, POST it to the NeLS portal and redirect the
//! browser back to the Galaxy root. The first failure terminates the flow.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode, Uri, Version},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::BridgeError;
use crate::origin::OriginParts;
use crate::transfer::{build_transfer_fields, Action, Identity};
use crate::upstream::{parse_cookie_header, serialize_cookies, UpstreamClient};

// =============================================================================
// Application State
// =============================================================================

/// Settings the callback handler needs per request.
#[derive(Debug, Clone)]
pub struct BridgeSettings {
    /// NeLS portal endpoint receiving the transfer-initiation POST
    pub transfer_api_url: String,

    /// Honor X-Forwarded-Host when reconstructing the Galaxy origin
    pub use_forwarded_host: bool,

    /// Treat inbound requests as TLS-terminated upstream
    pub tls_terminated: bool,

    /// Answer error pages with HTTP 200 like the original callback page
    pub legacy_error_status: bool,

    /// Server name fallback for origin resolution when no Host header exists
    pub server_name: String,

    /// Listening port, used in the server-name fallback
    pub server_port: u16,
}

impl From<&Config> for BridgeSettings {
    fn from(config: &Config) -> Self {
        Self {
            transfer_api_url: config.transfer_api_url.clone(),
            use_forwarded_host: config.use_forwarded_host,
            tls_terminated: config.tls_terminated,
            legacy_error_status: config.legacy_error_status,
            server_name: config.host.clone(),
            server_port: config.port,
        }
    }
}

/// Shared application state passed to all handlers via Axum's State extractor.
pub struct AppState<C: UpstreamClient> {
    /// Client for the Galaxy webhook API and the NeLS portal
    pub client: Arc<C>,

    /// Per-request handler settings
    pub settings: BridgeSettings,
}

impl<C: UpstreamClient> AppState<C> {
    /// Create a new application state.
    pub fn new(client: C, settings: BridgeSettings) -> Self {
        Self {
            client: Arc::new(client),
            settings,
        }
    }
}

impl<C: UpstreamClient> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            settings: self.settings.clone(),
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Query parameters of the callback request.
///
/// `action` is validated by hand so its absence produces the descriptive
/// error the callback page has always emitted.
#[derive(Debug, Deserialize)]
pub struct CallbackQueryParams {
    /// Transfer direction: `import` or `export`
    #[serde(default)]
    pub action: Option<String>,
}

// =============================================================================
// Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// A callback failure paired with the response-compatibility setting.
///
/// The error page keeps the original HTML shape (`Error:` + message). The
/// status code is a real 4xx/5xx unless legacy status compatibility is
/// requested, in which case every error page answers 200 like the PHP page
/// this bridge replaces.
#[derive(Debug)]
pub struct CallbackFailure {
    pub error: BridgeError,
    pub legacy_status: bool,
}

impl CallbackFailure {
    fn status(&self) -> StatusCode {
        if self.legacy_status {
            return StatusCode::OK;
        }
        if self.error.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::BAD_GATEWAY
        }
    }
}

impl IntoResponse for CallbackFailure {
    fn into_response(self) -> Response {
        let message = self.error.to_string();
        let status = self.status();

        if self.error.is_client_error() {
            warn!(status = status.as_u16(), "Callback rejected: {}", message);
        } else {
            error!(status = status.as_u16(), "Callback failed: {}", message);
        }

        let body = format!("<html><body><h2>Error:{}</h2></body></html>", message);

        (
            status,
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            body,
        )
            .into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle transfer callback requests.
///
/// # Endpoint
///
/// `POST /static/history_transfer_callback?action={import|export}`
///
/// # Parameters
///
/// - Query `action`: transfer direction, `import` or `export` (required)
/// - Form `selectedFiles`: comma-separated NeLS file paths for import, a
///   single NeLS directory path for export (required; may be empty). The
///   body is parsed as form data regardless of Content-Type, so an absent
///   or mistyped body reports the ordinary missing-parameter error
/// - Cookies: forwarded verbatim to the Galaxy webhook API as the sole
///   authentication mechanism
///
/// # Response
///
/// - `302 Found`: transfer initiated, `Location` points at the Galaxy root
/// - `400 Bad Request`: missing or invalid request parameter
/// - `502 Bad Gateway`: an upstream call failed or returned a malformed body
///
/// Error responses carry an HTML body of the form `Error:{message}`. With
/// legacy status compatibility enabled they answer 200 instead of 4xx/5xx.
pub async fn callback_handler<C: UpstreamClient>(
    State(state): State<AppState<C>>,
    Query(query): Query<CallbackQueryParams>,
    version: Version,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, CallbackFailure> {
    let legacy_status = state.settings.legacy_error_status;
    let fail = |error: BridgeError| CallbackFailure {
        error,
        legacy_status,
    };

    run_callback(&state, query, version, uri, headers, &body)
        .await
        .map_err(fail)
}

/// The linear callback flow. Split out of the handler so every step can short
/// circuit with `?`.
async fn run_callback<C: UpstreamClient>(
    state: &AppState<C>,
    query: CallbackQueryParams,
    version: Version,
    uri: Uri,
    headers: HeaderMap,
    form: &[u8],
) -> Result<Response, BridgeError> {
    // Step 1: validate the two request parameters.
    let action: Action = query
        .action
        .ok_or_else(|| BridgeError::missing_query("action"))?
        .parse()?;

    let selected_files = form_param(form, "selectedFiles")
        .ok_or_else(|| BridgeError::missing_form("selectedFiles"))?;

    // Step 2: resolve the Galaxy origin from request metadata.
    let origin = origin_parts(&state.settings, version, &uri, &headers);
    let galaxy_root = origin.origin_root(state.settings.use_forwarded_host);

    // Step 3: fetch the caller's identity, forwarding all inbound cookies.
    let cookie_header = collect_cookies(&headers);
    let identity_response = state
        .client
        .fetch_identity(&galaxy_root, action, &cookie_header)
        .await?;
    let identity = Identity::from_response(&identity_response)?;

    // Steps 4-5: build the field map and submit it to the NeLS portal. The
    // portal response carries no documented success flag, so a well-formed
    // JSON object is all that is checked.
    let fields = build_transfer_fields(action, &identity, &selected_files, &galaxy_root)?;
    state
        .client
        .submit_transfer(&state.settings.transfer_api_url, &fields)
        .await?;

    info!(
        action = %action,
        user = %identity.username,
        galaxy = %galaxy_root,
        "Transfer initiated, redirecting back to Galaxy"
    );

    // Step 6: redirect the browser back to the Galaxy root.
    Ok(redirect_found(&galaxy_root))
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Helpers
// =============================================================================

/// Build a `302 Found` redirect to the given location.
///
/// The original callback page answered 302, not the 303/307 variants Axum's
/// `Redirect` helpers produce, so the response is built by hand.
fn redirect_found(location: &str) -> Response {
    (
        StatusCode::FOUND,
        [(header::LOCATION, location.to_string())],
    )
        .into_response()
}

/// Extract a single parameter from a form-encoded request body.
///
/// A duplicated key keeps the last occurrence, like PHP's `$_POST`.
fn form_param(form: &[u8], name: &str) -> Option<String> {
    url::form_urlencoded::parse(form)
        .filter(|(key, _)| key == name)
        .last()
        .map(|(_, value)| value.into_owned())
}

/// Snapshot the connection metadata needed for origin resolution.
fn origin_parts(
    settings: &BridgeSettings,
    version: Version,
    uri: &Uri,
    headers: &HeaderMap,
) -> OriginParts {
    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    let forwarded_proto = header_str("x-forwarded-proto");
    let tls = settings.tls_terminated || forwarded_proto.as_deref() == Some("https");

    let request_uri = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    OriginParts {
        tls,
        protocol: format!("{:?}", version),
        host_header: header_str("host"),
        forwarded_host: header_str("x-forwarded-host"),
        server_name: settings.server_name.clone(),
        server_port: settings.server_port,
        request_uri,
    }
}

/// Gather every inbound cookie into a single `Cookie` header value.
fn collect_cookies(headers: &HeaderMap) -> String {
    let pairs: Vec<(&str, &str)> = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(parse_cookie_header)
        .collect();
    serialize_cookies(pairs)
}

// =============================================================================
// Tests
// =============================================================================
