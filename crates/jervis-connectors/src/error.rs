//! Error types for jervis-connectors

use thiserror::Error;

/// Connector/polling error type
#[derive(Debug, Error)]
pub enum Error {
    /// The remote provider returned an error response or malformed payload
    #[error("{provider} error: {message}")]
    Provider {
        /// Provider tag (`atlassian`, `gitlab`, `email`)
        provider: &'static str,
        /// Human-readable detail
        message: String,
    },

    /// Underlying HTTP transport failure
    #[error("network error: {0}")]
    Network(String),

    /// A connection's `authConfig` doesn't satisfy what the provider requires
    #[error("invalid auth configuration: {0}")]
    InvalidAuth(String),

    /// A webhook signature failed verification
    #[error("webhook signature verification failed")]
    InvalidSignature,

    /// Response body could not be parsed into the expected shape
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Network(e.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
