//! Error types for the update endpoint
//!
//! All fallible operations in this crate return [`Result`]. Every variant
//! below `Config` is converted into an [`UpdateStatus`](crate::UpdateStatus)
//! at the reconciler/handler boundary; `Config` is the one fatal error and
//! aborts service construction.

use crate::status::UpdateStatus;
use thiserror::Error;

/// Result type alias for update-endpoint operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the update endpoint
#[derive(Error, Debug)]
pub enum Error {
    /// Hostname or address failed syntactic parsing
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Hostname is well-formed but not a fully-qualified domain name
    /// (no subdomain in front of the registrable domain)
    #[error("not a fully-qualified domain name: {0}")]
    NotFqdn(String),

    /// Credential did not match the authorized token set
    #[error("authorization failed: {0}")]
    Unauthorized(String),

    /// No record with the requested name exists in the zone
    #[error("record not found: {0}")]
    NotFound(String),

    /// Configuration errors (fatal at service construction)
    #[error("configuration error: {0}")]
    Config(String),

    /// DNS provider call failure
    #[error("provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Network-related errors
    #[error("network error: {0}")]
    Network(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a "not an FQDN" error
    pub fn not_fqdn(msg: impl Into<String>) -> Self {
        Self::NotFqdn(msg.into())
    }

    /// Create an authorization error
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Map this error to the wire status reported to the client.
    ///
    /// The mapping is total: anything that is not an expected input,
    /// authorization, or lookup failure reports `othererr`.
    pub fn as_status(&self) -> UpdateStatus {
        match self {
            Self::InvalidInput(_) => UpdateStatus::InvalidInput,
            Self::NotFqdn(_) => UpdateStatus::NotFqdn,
            Self::Unauthorized(_) => UpdateStatus::BadAuth,
            Self::NotFound(_) => UpdateStatus::NoHost,
            _ => UpdateStatus::OtherErr,
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_is_total() {
        assert_eq!(
            Error::invalid_input("x").as_status(),
            UpdateStatus::InvalidInput
        );
        assert_eq!(Error::not_fqdn("x").as_status(), UpdateStatus::NotFqdn);
        assert_eq!(Error::unauthorized("x").as_status(), UpdateStatus::BadAuth);
        assert_eq!(Error::not_found("x").as_status(), UpdateStatus::NoHost);
        assert_eq!(
            Error::provider("test", "boom").as_status(),
            UpdateStatus::OtherErr
        );
        assert_eq!(Error::config("x").as_status(), UpdateStatus::OtherErr);
        assert_eq!(
            Error::Other("anything".to_string()).as_status(),
            UpdateStatus::OtherErr
        );
    }
}
