use thiserror::Error;

/// Errors that can occur while handling a transfer callback.
///
/// Every variant is terminal: the handler halts at the first failure and maps
/// it to an error response. There is no retry or fallback path.
#[derive(Debug, Clone, Error)]
pub enum BridgeError {
    /// A required request parameter is absent
    #[error("Missing '{name}' {location} parameter")]
    MissingParameter {
        name: &'static str,
        location: &'static str,
    },

    /// The `action` parameter is present but not one of the two known values
    #[error("Wrong 'action' parameter. Expected 'import' or 'export' but got '{0}'")]
    InvalidAction(String),

    /// An outbound call could not complete (connection, DNS, TLS, timeout)
    #[error("Transport error calling {url}: {message}")]
    Transport { url: String, message: String },

    /// An upstream response body is not valid JSON
    #[error("Unable to decode expected JSON return value from {url}: {message}")]
    Decode { url: String, message: String },

    /// An upstream response parsed as JSON but is not a key-value object
    #[error("Return value from {url} is not a JSON object")]
    Shape { url: String },

    /// The identity response is a JSON object but lacks a required field
    #[error("Identity response is missing the '{0}' field")]
    MissingIdentityField(&'static str),

    /// The identity API reported an application-level error (e.g. the user
    /// is not logged in or has no history to export)
    #[error("Galaxy webhook API reported an error: {0}")]
    Upstream(String),
}

impl BridgeError {
    /// Shorthand for a missing query parameter.
    pub fn missing_query(name: &'static str) -> Self {
        BridgeError::MissingParameter {
            name,
            location: "GET",
        }
    }

    /// Shorthand for a missing form parameter.
    pub fn missing_form(name: &'static str) -> Self {
        BridgeError::MissingParameter {
            name,
            location: "POST",
        }
    }

    /// Whether this error was caused by the inbound request rather than an
    /// upstream service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            BridgeError::MissingParameter { .. } | BridgeError::InvalidAction(_)
        )
    }
}
