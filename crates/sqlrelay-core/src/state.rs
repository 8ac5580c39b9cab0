//! Connection state broadcast by the connection manager
//!
//! Only the latest state matters to consumers; no history is kept.

use serde::{Deserialize, Serialize};

/// Liveness state of a pooled connection
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Not connected, or shut down
    #[default]
    Idle,
    /// `connect()` was called and the first probe has not finished
    Connecting,
    /// The last liveness probe succeeded
    Connected,
    /// The last probe or query failed with the given description
    Error(String),
}

impl ConnectionState {
    /// Short event code, as seen by status consumers
    pub fn code(&self) -> &'static str {
        match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Error(_) => "error",
        }
    }

    /// Error description, if this is an error state
    pub fn message(&self) -> Option<&str> {
        match self {
            ConnectionState::Error(msg) => Some(msg),
            _ => None,
        }
    }

    /// Check if the last probe succeeded.
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    /// Check if this is an error state.
    pub fn is_error(&self) -> bool {
        matches!(self, ConnectionState::Error(_))
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Error(msg) => write!(f, "error: {}", msg),
            other => f.write_str(other.code()),
        }
    }
}
