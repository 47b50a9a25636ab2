//! Error types for assessment providers.

use std::time::Duration;

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving or calling a provider.
#[derive(Debug, Error)]
pub enum Error {
    /// Provider configuration is missing or invalid.
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    /// Credentials not found for provider.
    #[error("credentials not found for provider: {0}")]
    CredentialsNotFound(String),

    /// Failed to access system keyring.
    #[error("keyring error: {0}")]
    Keyring(String),

    /// Provider returned a non-success status.
    #[error("provider API error ({status}): {body}")]
    ProviderApi { status: u16, body: String },

    /// Request failed before a response was received.
    #[error("request failed: {0}")]
    Request(String),

    /// Request exceeded its deadline.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Request(err.to_string())
    }
}
