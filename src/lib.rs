//! # NeLS Transfer Bridge
//!
//! A webhook callback bridge between a Galaxy data-management instance and
//! the NeLS storage portal.
//!
//! Galaxy's NeLS webhook pages redirect the user's browser to this bridge
//! with a transfer direction and a file selection. The bridge resolves the
//! caller's identity by calling back into the originating Galaxy instance
//! (authenticated by the forwarded session cookie), assembles a
//! transfer-initiation payload, POSTs it to the NeLS portal API and redirects
//! the browser back to Galaxy where progress is tracked.
//!
//! ## Architecture
//!
//! The whole service is one linear request flow with no state across
//! requests:
//!
//! - [`server`] - Axum-based HTTP server, routes and the callback handler
//! - [`origin`] - Reconstruction of the Galaxy origin URL from request metadata
//! - [`transfer`] - Action, identity and transfer-field record types
//! - [`upstream`] - Outbound calls to the Galaxy webhook API and NeLS portal
//! - [`config`] - CLI and configuration types
//! - [`error`] - Error taxonomy shared by every step

pub mod config;
pub mod error;
pub mod origin;
pub mod server;
pub mod transfer;
pub mod upstream;

// Re-export commonly used types
pub use config::{Config, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_TRANSFER_API_URL};
pub use error::BridgeError;
pub use origin::{origin_root_of, OriginParts, STATIC_MARKER};
pub use server::{
    create_router, AppState, BridgeSettings, CallbackFailure, HealthResponse, RouterConfig,
    CALLBACK_PATH, LEGACY_CALLBACK_PATH,
};
pub use transfer::{build_transfer_fields, Action, Identity, TransferFields};
pub use upstream::{
    parse_cookie_header, serialize_cookies, HttpUpstreamClient, UpstreamClient,
    DEFAULT_UPSTREAM_TIMEOUT_SECS,
};
