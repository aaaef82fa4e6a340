//! Router configuration for the transfer callback bridge.
//!
//! # Route Structure
//!
//! ```text
//! /health                                  - Health check
//! /static/history_transfer_callback        - Transfer callback (POST)
//! /static/history_transfer_callback.php    - Legacy callback path (POST)
//! ```
//!
//! The callback lives under `/static/` on purpose: the Galaxy origin root is
//! recovered by splitting the request URL on that path segment, so the bridge
//! must be proxied into the Galaxy instance's static asset tree.

use std::time::Duration;

use axum::{routing::get, routing::post, Router};
use http::header::CONTENT_TYPE;
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{callback_handler, health_handler, AppState, BridgeSettings};
use crate::upstream::UpstreamClient;

/// Path the callback is served on.
pub const CALLBACK_PATH: &str = "/static/history_transfer_callback";

/// Legacy path kept for pages still pointing at the PHP file this bridge
/// replaces.
pub const LEGACY_CALLBACK_PATH: &str = "/static/history_transfer_callback.php";

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            cors_origins: None,
            enable_tracing: true,
        }
    }
}

impl RouterConfig {
    /// Set specific allowed CORS origins.
    ///
    /// Pass None (or don't call this method) to allow any origin.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// # Arguments
///
/// * `client` - Upstream client for the Galaxy webhook API and NeLS portal
/// * `settings` - Handler settings (transfer API URL, origin resolution flags)
/// * `config` - Router configuration
pub fn create_router<C>(client: C, settings: BridgeSettings, config: RouterConfig) -> Router
where
    C: UpstreamClient + 'static,
{
    let state = AppState::new(client, settings);
    let cors = build_cors_layer(&config);

    let router = Router::new()
        .route("/health", get(health_handler))
        .route(CALLBACK_PATH, post(callback_handler::<C>))
        .route(LEGACY_CALLBACK_PATH, post(callback_handler::<C>))
        .with_state(state)
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(86400));

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
