//! Error types for the OTOBO client.
//!
//! This module defines `OtoboError`, the unified error type used throughout
//! the crate. Every failure falls into one of three classes:
//!
//! - **configuration**: the caller asked for something the client was never
//!   set up for (unconfigured operation, missing credentials, invalid input).
//!   Detected before any network I/O.
//! - **API**: the ticket system answered with its structured `Error`
//!   envelope. Carries the server's code and message verbatim.
//! - **transport**: the request never produced a usable response (network
//!   failure, non-2xx status without an envelope, undecodable body).
//!
//! The client performs no retries; callers that want a retry policy build it
//! on top of these classes via [`OtoboError::is_transport_error`].

use thiserror::Error;

use crate::operation::TicketOperation;

/// Unified error type for all client, descriptor, and console operations.
///
/// Each variant provides specific context about the failure. Passwords are
/// never included in error messages; see `Credentials` in the config module.
#[derive(Error, Debug)]
pub enum OtoboError {
    /// Configuration error - missing or invalid environment variables,
    /// malformed descriptors, or misuse of a builder.
    #[error("configuration error: {0}")]
    Config(String),

    /// A ticket operation was invoked without an endpoint-map entry.
    #[error("operation {operation} is not configured on this client")]
    NotConfigured {
        /// The operation missing from the endpoint map.
        operation: TicketOperation,
    },

    /// A ticket operation was invoked with no credentials loaded.
    #[error("no credentials loaded - call login() or configure credentials")]
    NotAuthenticated,

    /// Input validation failed (e.g. an IdName with neither id nor name).
    #[error("validation error: {0}")]
    Validation(String),

    /// The ticket system returned its structured error envelope.
    ///
    /// Raised regardless of HTTP status: the server reports business errors
    /// inside 200-status bodies.
    #[error("OTOBO error {code}: {message}")]
    Api {
        /// Server-assigned error code (e.g. `TicketGet.NotAuthorized`).
        code: String,
        /// Human-readable error message from the server.
        message: String,
    },

    /// The response decoded but did not contain what the operation needs,
    /// e.g. a get that returned zero tickets.
    #[error("unexpected {operation} response: {detail}")]
    UnexpectedResponse {
        /// The operation whose response was unusable.
        operation: TicketOperation,
        /// What was wrong with the response.
        detail: String,
    },

    /// HTTP request failed during transmission.
    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),

    /// HTTP client initialization failed.
    #[error("HTTP client error: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// HTTP response returned a non-success status without an error envelope.
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// The HTTP status code returned.
        status: reqwest::StatusCode,
        /// The response body, truncated to a readable length.
        body: String,
    },

    /// JSON serialization or deserialization failed.
    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML serialization or deserialization failed (webservice descriptors).
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// File or subprocess I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl OtoboError {
    /// Creates a configuration error for a missing environment variable.
    pub fn missing_env(var_name: &str) -> Self {
        OtoboError::Config(format!(
            "missing required environment variable: {}",
            var_name
        ))
    }

    /// Creates a configuration error for an invalid value.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        OtoboError::Config(message.into())
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        OtoboError::Validation(message.into())
    }

    /// Creates an API error from a server error envelope.
    pub fn api(code: impl Into<String>, message: impl Into<String>) -> Self {
        OtoboError::Api {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Creates an error for a decodable response with unusable content.
    pub fn unexpected_response(operation: TicketOperation, detail: impl Into<String>) -> Self {
        OtoboError::UnexpectedResponse {
            operation,
            detail: detail.into(),
        }
    }

    /// Returns true for failures the caller caused: the request was never
    /// sent because the client was not configured or the input was invalid.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            OtoboError::Config(_)
                | OtoboError::NotConfigured { .. }
                | OtoboError::NotAuthenticated
                | OtoboError::Validation(_)
        )
    }

    /// Returns true if the ticket system reported a business error.
    #[must_use]
    pub fn is_api_error(&self) -> bool {
        matches!(self, OtoboError::Api { .. })
    }

    /// Returns true for network, HTTP-status, and decoding failures.
    #[must_use]
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            OtoboError::Http(_)
                | OtoboError::HttpClient(_)
                | OtoboError::HttpStatus { .. }
                | OtoboError::UnexpectedResponse { .. }
                | OtoboError::Serialization(_)
                | OtoboError::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_env_error() {
        let err = OtoboError::missing_env("OTOBO_BASE_URL");
        assert!(err.to_string().contains("OTOBO_BASE_URL"));
        assert!(err.to_string().contains("missing"));
        assert!(err.is_config_error());
    }

    #[test]
    fn test_validation_error() {
        let err = OtoboError::validation("IdName needs an id or a name");
        assert_eq!(
            err.to_string(),
            "validation error: IdName needs an id or a name"
        );
        assert!(err.is_config_error());
    }

    #[test]
    fn test_not_configured_names_operation() {
        let err = OtoboError::NotConfigured {
            operation: TicketOperation::Search,
        };
        assert!(err.to_string().contains("search"));
        assert!(err.is_config_error());
        assert!(!err.is_api_error());
    }

    #[test]
    fn test_api_error_display() {
        let err = OtoboError::api("TicketGet.AccessDenied", "not authorized");
        assert_eq!(
            err.to_string(),
            "OTOBO error TicketGet.AccessDenied: not authorized"
        );
        assert!(err.is_api_error());
        assert!(!err.is_transport_error());
    }

    #[test]
    fn test_http_status_is_transport() {
        let err = OtoboError::HttpStatus {
            status: reqwest::StatusCode::BAD_GATEWAY,
            body: "upstream down".to_string(),
        };
        assert!(err.is_transport_error());
        assert!(!err.is_config_error());
    }

    #[test]
    fn test_not_authenticated_is_config() {
        let err = OtoboError::NotAuthenticated;
        assert!(err.is_config_error());
        assert!(err.to_string().contains("credentials"));
    }

    #[test]
    fn test_unexpected_response_is_transport() {
        let err =
            OtoboError::unexpected_response(TicketOperation::Get, "expected exactly one ticket");
        assert_eq!(
            err.to_string(),
            "unexpected get response: expected exactly one ticket"
        );
        assert!(err.is_transport_error());
        assert!(!err.is_config_error());
    }
}
