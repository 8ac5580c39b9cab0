//! State broadcasting
//!
//! A small observer: components `subscribe` a listener, receive every
//! [`ConnectionState`] passed to `notify`, and `unsubscribe` with the id
//! they were given. Listeners run synchronously, in registration order, on
//! the notifying task.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::ConnectionState;

/// Receives state changes from a [`StateBroadcaster`]
pub trait StateListener: Send + Sync {
    fn on_state(&self, state: &ConnectionState);
}

impl<F> StateListener for F
where
    F: Fn(&ConnectionState) + Send + Sync,
{
    fn on_state(&self, state: &ConnectionState) {
        self(state)
    }
}

/// Handle returned by [`StateBroadcaster::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Fan-out of connection states to registered listeners
pub struct StateBroadcaster {
    listeners: Mutex<Vec<(ListenerId, Arc<dyn StateListener>)>>,
    latest: Mutex<ConnectionState>,
    next_id: AtomicU64,
}

impl StateBroadcaster {
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
            latest: Mutex::new(ConnectionState::Idle),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a listener. It does not receive the current state, only
    /// states notified after this call.
    pub fn subscribe(&self, listener: Arc<dyn StateListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.listeners.lock().push((id, listener));
        tracing::trace!(listener = id.0, "state listener subscribed");
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        before != listeners.len()
    }

    /// Record `state` as the latest and deliver it to every listener.
    pub fn notify(&self, state: ConnectionState) {
        *self.latest.lock() = state.clone();

        // Snapshot so listeners may subscribe/unsubscribe while being notified
        let listeners: Vec<Arc<dyn StateListener>> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();

        tracing::debug!(state = state.code(), listeners = listeners.len(), "broadcasting state");
        for listener in listeners {
            listener.on_state(&state);
        }
    }

    /// The most recently notified state
    pub fn latest(&self) -> ConnectionState {
        self.latest.lock().clone()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }
}

impl Default for StateBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
