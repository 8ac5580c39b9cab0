//! Query relay
//!
//! Validates incoming messages, runs them through the connection manager
//! and reports the outcome to the host.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use sqlrelay_connection::ConnectionManager;
use sqlrelay_core::{ConnectionState, ListenerId, SqlRelayError, StateListener};

use crate::{Message, NodeStatus, QueryRequest, RelayHost};

/// Mirrors manager state onto the host status
struct StatusForwarder {
    host: Arc<dyn RelayHost>,
}

impl StateListener for StatusForwarder {
    fn on_state(&self, state: &ConnectionState) {
        self.host.status(NodeStatus::from(state));
    }
}

/// Relays query messages from a host to a shared [`ConnectionManager`]
pub struct QueryRelay {
    manager: Option<Arc<ConnectionManager>>,
    host: Arc<dyn RelayHost>,
    listener: Mutex<Option<ListenerId>>,
    closed: AtomicBool,
}

impl QueryRelay {
    /// Start a relay.
    ///
    /// Without a manager the relay reports a configuration error and ignores
    /// all input. Otherwise it follows the manager's state and triggers
    /// `connect()` in a background task, so this must run inside a Tokio
    /// runtime.
    pub fn start(manager: Option<Arc<ConnectionManager>>, host: Arc<dyn RelayHost>) -> Self {
        let Some(manager) = manager else {
            tracing::error!("relay started without a database");
            host.error(
                &SqlRelayError::Configuration("MySQL database not configured".into()),
                None,
            );
            return Self {
                manager: None,
                host,
                listener: Mutex::new(None),
                closed: AtomicBool::new(false),
            };
        };

        let listener = manager.subscribe(Arc::new(StatusForwarder { host: host.clone() }));

        let connecting = manager.clone();
        tokio::spawn(async move {
            if let Err(e) = connecting.connect().await {
                tracing::warn!(error = %e, "initial connect failed");
            }
        });

        tracing::debug!(server = %manager.server().target(), "relay started");
        Self {
            manager: Some(manager),
            host,
            listener: Mutex::new(Some(listener)),
            closed: AtomicBool::new(false),
        }
    }

    /// Whether the relay started without a manager
    pub fn is_inert(&self) -> bool {
        self.manager.is_none()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Handle one incoming message.
    ///
    /// Invalid messages are reported without reaching the database. Query
    /// failures are reported with the message attached, and also shown as
    /// the relay's status.
    #[tracing::instrument(skip(self, message))]
    pub async fn handle(&self, message: Message) {
        let Some(manager) = &self.manager else {
            tracing::debug!("no database configured, ignoring message");
            return;
        };
        if self.is_closed() {
            tracing::debug!("relay closed, ignoring message");
            return;
        }

        let request = match QueryRequest::from_message(&message) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "rejected message");
                self.host.error(&e, None);
                return;
            }
        };

        let result = manager
            .query(&request.statement, request.params.as_ref())
            .await;

        if self.is_closed() {
            tracing::debug!("relay closed while query was running, dropping result");
            return;
        }

        match result {
            Ok(result) => {
                self.host.status(NodeStatus::query_done());
                let mut out = message;
                out.payload = Some(result.to_payload());
                self.host.send(out);
            }
            Err(e) => {
                self.host.error(&e, Some(&message));
                self.host.status(NodeStatus::error(e.to_string()));
            }
        }
    }

    /// Stop following the manager and clear the status.
    ///
    /// Only this relay's listener is removed; other relays sharing the
    /// manager are unaffected.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);

        if let Some(manager) = &self.manager
            && let Some(id) = self.listener.lock().take()
        {
            manager.unsubscribe(id);
        }

        self.host.status(NodeStatus::clear());
    }
}
