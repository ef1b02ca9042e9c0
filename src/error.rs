//! Error types for FinTrip
//!
//! This module defines all error types used throughout the client,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for FinTrip operations
///
/// Variants line up with the way callers are expected to react: validation
/// problems are shown inline, transport and API failures get a generic
/// message, `Unauthorized` has already been handled globally by the HTTP
/// client by the time a caller sees it.
#[derive(Error, Debug)]
pub enum FintripError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local input validation failed (empty fields, malformed email, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// The backend rejected the credentials or returned a non-success code
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// The session expired (HTTP 401); the session has been cleared
    #[error("Session expired: {0}")]
    Unauthorized(String),

    /// Non-success HTTP status other than 401
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code returned by the backend
        status: u16,
        /// Backend `message` field, or the raw body when absent
        message: String,
    },

    /// Connection failures and timeouts
    #[error("Transport error: {0}")]
    Transport(String),

    /// Upstream lookup returned nothing (e.g. unknown place name)
    #[error("{0}")]
    NotFound(String),

    /// Client storage errors (storage file unreadable or unwritable)
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl FintripError {
    /// Returns `true` for errors the user should see as "could not reach the
    /// server" rather than as a specific message.
    pub fn is_network(&self) -> bool {
        matches!(self, FintripError::Transport(_) | FintripError::Http(_))
    }
}

/// Result type alias for FinTrip operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation. Callers that
/// need to branch on the kind use `downcast_ref::<FintripError>()`.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = FintripError::Config("invalid format".to_string());
        assert_eq!(error.to_string(), "Configuration error: invalid format");
    }

    #[test]
    fn test_validation_error_display() {
        let error = FintripError::Validation("email is required".to_string());
        assert_eq!(error.to_string(), "Validation error: email is required");
    }

    #[test]
    fn test_api_error_display() {
        let error = FintripError::Api {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(error.to_string(), "API error (status 500): boom");
    }

    #[test]
    fn test_not_found_display_is_bare_message() {
        let error = FintripError::NotFound("Location not found".to_string());
        assert_eq!(error.to_string(), "Location not found");
    }

    #[test]
    fn test_unauthorized_display() {
        let error = FintripError::Unauthorized("token rejected".to_string());
        assert_eq!(error.to_string(), "Session expired: token rejected");
    }

    #[test]
    fn test_is_network() {
        assert!(FintripError::Transport("timed out".into()).is_network());
        assert!(!FintripError::Validation("x".into()).is_network());
        assert!(!FintripError::Unauthorized("x".into()).is_network());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: FintripError = io_error.into();
        assert!(matches!(error, FintripError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{invalid json}").unwrap_err();
        let error: FintripError = json_error.into();
        assert!(matches!(error, FintripError::Serialization(_)));
    }

    #[test]
    fn test_downcast_through_anyhow() {
        let result: Result<()> = Err(FintripError::NotFound("Location not found".into()).into());
        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FintripError>(),
            Some(FintripError::NotFound(_))
        ));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FintripError>();
    }
}
