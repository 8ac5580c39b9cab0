//! Error types for sqlrelay

use thiserror::Error;

/// Core error type for sqlrelay operations
#[derive(Error, Debug)]
pub enum SqlRelayError {
    /// No backing connection is configured, or the configuration is unusable
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A request was malformed and was not forwarded
    #[error("Validation error: {0}")]
    Validation(String),

    /// The pool could not reach the database
    #[error("Connection error: {0}")]
    Connection(String),

    /// The database rejected or failed a statement
    #[error("Query error: {0}")]
    Query(String),

    #[error("Not connected: connect() has not been called")]
    NotConnected,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type alias for sqlrelay operations
pub type Result<T> = std::result::Result<T, SqlRelayError>;
