//! Pool traits and pool configuration
//!
//! The connection manager treats the pool as an opaque capability: it asks
//! a [`PoolFactory`] for one [`Pool`] per manager and only ever runs
//! fully-formatted statements through it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{QueryResult, Result, ServerConfig, Value};

/// A pooled set of database connections
#[async_trait]
pub trait Pool: Send + Sync {
    /// Get the driver name (e.g., "mysql")
    fn driver_name(&self) -> &str;

    /// Render `value` as a SQL literal safe to splice into a statement
    fn escape(&self, value: &Value) -> String;

    /// Run a statement and return its first result set
    async fn query(&self, sql: &str) -> Result<QueryResult>;

    /// Drain and close every connection in the pool
    async fn close(&self) -> Result<()>;

    /// Check if the pool has been closed
    fn is_closed(&self) -> bool;
}

/// Creates pools. Creation must not perform I/O: the first connection is
/// opened lazily by the first query.
pub trait PoolFactory: Send + Sync {
    fn create(&self, server: &ServerConfig, config: &PoolConfig) -> Result<Arc<dyn Pool>>;
}

impl<T: PoolFactory> PoolFactory for Arc<T> {
    fn create(&self, server: &ServerConfig, config: &PoolConfig) -> Result<Arc<dyn Pool>> {
        (**self).create(server, config)
    }
}

/// Configuration for a connection pool
///
/// Controls pool sizing, queueing and the connect timeout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum number of connections open at once
    max_connections: usize,
    /// Maximum number of queued requests; 0 means unbounded
    queue_limit: usize,
    /// Whether requests wait for a free connection instead of failing
    wait_for_connections: bool,
    /// Timeout in milliseconds when opening a new connection
    connect_timeout_ms: u64,
}

impl PoolConfig {
    /// Create a new pool configuration with the given connection limit
    ///
    /// # Panics
    ///
    /// Panics if `max_connections` is 0.
    pub fn new(max_connections: usize) -> Self {
        assert!(
            max_connections > 0,
            "max_connections must be greater than 0, got {}",
            max_connections
        );

        Self {
            max_connections,
            queue_limit: 0,
            wait_for_connections: true,
            connect_timeout_ms: 1_000,
        }
    }

    /// Set the queue limit (0 = unbounded)
    pub fn with_queue_limit(mut self, limit: usize) -> Self {
        self.queue_limit = limit;
        self
    }

    /// Set whether requests wait for a free connection
    pub fn with_wait_for_connections(mut self, wait: bool) -> Self {
        self.wait_for_connections = wait;
        self
    }

    /// Set the connect timeout in milliseconds
    pub fn with_connect_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.connect_timeout_ms = timeout_ms;
        self
    }

    /// Get the maximum number of concurrent connections
    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    /// Get the queue limit, `None` when unbounded
    pub fn queue_limit(&self) -> Option<usize> {
        (self.queue_limit > 0).then_some(self.queue_limit)
    }

    pub fn wait_for_connections(&self) -> bool {
        self.wait_for_connections
    }

    /// Get the connect timeout as a Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for PoolConfig {
    /// Defaults: 5 connections, unbounded queue, waiting enabled, 1s connect timeout
    fn default() -> Self {
        Self::new(5)
    }
}
