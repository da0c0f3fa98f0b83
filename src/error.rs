//! Error types for the Security Group Operator

use thiserror::Error;

/// Result type alias using the operator's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Operator error types
#[derive(Error, Debug)]
pub enum Error {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// DCS management service error (transport failure or non-success response)
    #[error("DCS API error: {0}")]
    Adapter(String),

    /// Record store error outside of the Kubernetes client (e.g. stale write)
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a DCS API error
    pub fn adapter(msg: impl Into<String>) -> Self {
        Error::Adapter(msg.into())
    }

    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        Error::Store(msg.into())
    }

    /// Whether the error is an optimistic-concurrency conflict on a record write
    pub fn is_conflict(&self) -> bool {
        match self {
            Error::Kube(kube::Error::Api(resp)) => resp.code == 409,
            _ => false,
        }
    }
}
