//! Configuration management for the NeLS transfer bridge.
//!
//! Configuration comes from command-line arguments via clap, with environment
//! variable overrides using the `NELS_` prefix and sensible defaults for
//! everything except nothing — the bridge can start with no arguments at all.
//!
//! # Environment Variables
//!
//! - `NELS_HOST` - Server bind address (default: 0.0.0.0)
//! - `NELS_PORT` - Server port (default: 3000)
//! - `NELS_TRANSFER_API_URL` - NeLS portal transfer-initiation endpoint
//! - `NELS_USE_FORWARDED_HOST` - Honor X-Forwarded-Host for origin resolution
//! - `NELS_TLS_TERMINATED` - Treat inbound requests as TLS-terminated upstream
//! - `NELS_UPSTREAM_TIMEOUT` - Outbound call timeout in seconds (default: 30)
//! - `NELS_LEGACY_ERROR_STATUS` - Emit HTTP 200 for error pages
//! - `NELS_CORS_ORIGINS` - Allowed CORS origins (comma-separated)

use clap::Parser;
use url::Url;

use crate::upstream::DEFAULT_UPSTREAM_TIMEOUT_SECS;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default NeLS portal transfer-initiation endpoint.
pub const DEFAULT_TRANSFER_API_URL: &str = "https://tare.medisin.ntnu.no/nels_portal/api.php";

// =============================================================================
// CLI Arguments
// =============================================================================

/// NeLS Transfer Bridge - webhook callback bridge between Galaxy and NeLS.
///
/// Receives browser callbacks from the Galaxy NeLS webhook pages, resolves
/// the calling user's identity via the Galaxy webhook API and forwards a
/// transfer-initiation request to the NeLS portal.
#[derive(Parser, Debug, Clone)]
#[command(name = "nels-transfer-bridge")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "NELS_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "NELS_PORT")]
    pub port: u16,

    // =========================================================================
    // Upstream Configuration
    // =========================================================================
    /// NeLS portal endpoint that receives transfer-initiation requests.
    #[arg(long, default_value = DEFAULT_TRANSFER_API_URL, env = "NELS_TRANSFER_API_URL")]
    pub transfer_api_url: String,

    /// Timeout for each outbound call, in seconds.
    #[arg(long, default_value_t = DEFAULT_UPSTREAM_TIMEOUT_SECS, env = "NELS_UPSTREAM_TIMEOUT")]
    pub upstream_timeout: u64,

    // =========================================================================
    // Origin Resolution
    // =========================================================================
    /// Use the X-Forwarded-Host header when reconstructing the Galaxy origin.
    ///
    /// Only enable when the bridge sits behind a trusted reverse proxy.
    #[arg(long, default_value_t = false, env = "NELS_USE_FORWARDED_HOST")]
    pub use_forwarded_host: bool,

    /// Treat inbound requests as TLS-terminated by an upstream proxy.
    ///
    /// When set, resolved origin URLs use the https scheme even though the
    /// bridge itself listens on plain HTTP. Requests carrying
    /// `X-Forwarded-Proto: https` are treated as TLS regardless of this flag.
    #[arg(long, default_value_t = false, env = "NELS_TLS_TERMINATED")]
    pub tls_terminated: bool,

    // =========================================================================
    // Error Response Compatibility
    // =========================================================================
    /// Emit HTTP 200 for error pages instead of 4xx/5xx.
    ///
    /// The original callback page always answered 200 with an HTML error
    /// body. Enable only if a client depends on that behavior.
    #[arg(long, default_value_t = false, env = "NELS_LEGACY_ERROR_STATUS")]
    pub legacy_error_status: bool,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "NELS_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        let url = Url::parse(&self.transfer_api_url)
            .map_err(|e| format!("Invalid transfer API URL '{}': {}", self.transfer_api_url, e))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(format!(
                "Transfer API URL must be http or https, got '{}'",
                url.scheme()
            ));
        }

        if self.upstream_timeout == 0 {
            return Err("upstream_timeout must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// Tests
// =============================================================================
