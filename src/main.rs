//! NeLS Transfer Bridge - callback bridge between Galaxy and the NeLS portal.
//!
//! This binary parses the configuration, wires up the HTTP client and starts
//! the server.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nels_transfer_bridge::{
    config::Config,
    server::{create_router, BridgeSettings, RouterConfig},
    upstream::HttpUpstreamClient,
    CALLBACK_PATH,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("NeLS Transfer Bridge v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Transfer API: {}", config.transfer_api_url);
    info!("  Upstream timeout: {}s", config.upstream_timeout);
    info!("  Forwarded host: {}", on_off(config.use_forwarded_host));
    info!("  TLS terminated upstream: {}", on_off(config.tls_terminated));
    if config.legacy_error_status {
        warn!("  Legacy error status enabled - error pages will answer HTTP 200");
    }

    let client = match HttpUpstreamClient::with_timeout(Duration::from_secs(config.upstream_timeout))
    {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let settings = BridgeSettings::from(&config);
    let router_config = build_router_config(&config);
    let router = create_router(client, settings, router_config);

    let addr = config.bind_address();

    info!("");
    info!("Server listening on: http://{}", addr);
    info!("  Callback endpoint: POST http://{}{}", addr, CALLBACK_PATH);
    info!("  Health check:      GET  http://{}/health", addr);
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "enabled"
    } else {
        "disabled"
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "nels_transfer_bridge=debug,tower_http=debug"
    } else {
        "nels_transfer_bridge=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application Config.
fn build_router_config(config: &Config) -> RouterConfig {
    let mut router_config = RouterConfig::default().with_tracing(!config.no_tracing);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config
}
