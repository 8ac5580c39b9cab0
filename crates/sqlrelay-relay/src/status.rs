//! Status indicator shown by the host next to a relay

use serde::{Deserialize, Serialize};
use sqlrelay_core::ConnectionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFill {
    Red,
    Green,
    Blue,
    Grey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusShape {
    Ring,
    Dot,
}

/// A status indicator; all fields empty means cleared
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodeStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<StatusFill>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<StatusShape>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl NodeStatus {
    pub fn new(fill: StatusFill, shape: StatusShape, text: impl Into<String>) -> Self {
        Self {
            fill: Some(fill),
            shape: Some(shape),
            text: Some(text.into()),
        }
    }

    pub fn clear() -> Self {
        Self::default()
    }

    pub fn is_clear(&self) -> bool {
        self.fill.is_none() && self.shape.is_none() && self.text.is_none()
    }

    pub fn connecting() -> Self {
        Self::new(StatusFill::Grey, StatusShape::Ring, "connecting...")
    }

    pub fn connected() -> Self {
        Self::new(StatusFill::Green, StatusShape::Dot, "connected")
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(StatusFill::Red, StatusShape::Ring, message)
    }

    pub fn query_done() -> Self {
        Self::new(StatusFill::Blue, StatusShape::Dot, "query done")
    }
}

impl From<&ConnectionState> for NodeStatus {
    fn from(state: &ConnectionState) -> Self {
        match state {
            ConnectionState::Connecting => Self::connecting(),
            ConnectionState::Connected => Self::connected(),
            ConnectionState::Error(message) => Self::error(message.clone()),
            ConnectionState::Idle => Self::clear(),
        }
    }
}
