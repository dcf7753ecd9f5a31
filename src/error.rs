//! Error types for attachment-dl
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error variants (Auth, Service, Network, I/O)
//! - Context information (operation name, configuration key)
//! - A crate-wide [`Result`] alias

use thiserror::Error;

/// Result type alias for attachment-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for attachment-dl
///
/// This is the primary error type used throughout the library. Each variant includes
/// contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "service_url")
        key: Option<String>,
    },

    /// Token exchange with the portal failed
    #[error("authentication error: {0}")]
    Auth(String),

    /// The feature service returned an error for a request
    ///
    /// Feature services report many failures inside an HTTP 200 response body,
    /// so this variant covers both transport-level non-2xx statuses and
    /// in-body `error` objects.
    #[error("feature service error during {operation}: {detail}")]
    Service {
        /// The operation that failed (e.g., "query object ids")
        operation: String,
        /// Error detail reported by the service
        detail: String,
    },

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A configured URL could not be parsed
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Build a [`Error::Service`] from an operation name and error detail
    pub(crate) fn service(operation: impl Into<String>, detail: impl Into<String>) -> Self {
        Error::Service {
            operation: operation.into(),
            detail: detail.into(),
        }
    }
}
