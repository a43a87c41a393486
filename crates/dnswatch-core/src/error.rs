//! Error types for the DNS watcher.

use thiserror::Error;

/// Result type alias for watcher operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DNS watcher
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid watcher configuration (wrong method, empty server list, bad interval)
    #[error("configuration error: {0}")]
    Config(String),

    /// A DNS lookup failed (timeout, NXDOMAIN, network error)
    #[error("resolve error for {host}: {message}")]
    Resolve {
        /// Hostname that failed to resolve
        host: String,
        /// Resolver-reported failure
        message: String,
    },

    /// The downstream backend-set consumer rejected an update
    #[error("backend sink error: {0}")]
    Sink(String),

    /// I/O errors from sink implementations
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a resolve error for a hostname
    pub fn resolve(host: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Resolve {
            host: host.into(),
            message: message.into(),
        }
    }

    /// Create a backend sink error
    pub fn sink(msg: impl Into<String>) -> Self {
        Self::Sink(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
