//! HTTP server layer for the transfer callback bridge.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                             │
//! │       POST /static/history_transfer_callback?action=...        │
//! │                                                                │
//! │  ┌──────────────────────────┐  ┌───────────────────────────┐   │
//! │  │         handlers         │  │          routes           │   │
//! │  │ (validate, orchestrate)  │  │     (router config)       │   │
//! │  └──────────────────────────┘  └───────────────────────────┘   │
//! └────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    callback_handler, health_handler, AppState, BridgeSettings, CallbackFailure,
    CallbackQueryParams, HealthResponse,
};
pub use routes::{create_router, RouterConfig, CALLBACK_PATH, LEGACY_CALLBACK_PATH};
