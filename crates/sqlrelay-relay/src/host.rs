use sqlrelay_core::SqlRelayError;

use crate::{Message, NodeStatus};

/// The runtime hosting a relay: routes its output, shows its status and
/// collects its errors.
pub trait RelayHost: Send + Sync {
    /// Replace the displayed status
    fn status(&self, status: NodeStatus);

    /// Forward a message to the relay's output
    fn send(&self, message: Message);

    /// Report an error, optionally tied to the message that caused it
    fn error(&self, error: &SqlRelayError, message: Option<&Message>);
}
