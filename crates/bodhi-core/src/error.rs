//! Error types for the Bodhi interactor.

use thiserror::Error;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type shared by the backend, chain, and API crates.
#[derive(Error, Debug)]
pub enum Error {
    /// Postgres operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Hosted backend answered with a non-success status
    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input (bad identifier, malformed parameter, ambiguous result)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Authenticated but not authorized
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Signature recovery or JSON-RPC failure
    #[error("Chain error: {0}")]
    Chain(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("bodhi_constants key=fee".to_string());
        assert_eq!(err.to_string(), "Not found: bodhi_constants key=fee");
    }

    #[test]
    fn test_error_display_backend() {
        let err = Error::Backend {
            status: 404,
            message: "relation does not exist".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Backend error (404): relation does not exist"
        );
    }

    #[test]
    fn test_error_display_chain() {
        let err = Error::Chain("invalid signature length".to_string());
        assert_eq!(err.to_string(), "Chain error: invalid signature length");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
