//! Pool ping
//!
//! Runs the liveness statement through the pool and measures response time.

use std::time::{Duration, Instant};

use sqlrelay_core::Pool;
use thiserror::Error;

/// Result of a ping operation
pub type PingResult = Result<Duration, PingError>;

/// Error that can occur during a ping operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PingError {
    /// The pool is closed
    #[error("Pool is closed")]
    PoolClosed,
    /// Statement execution failed
    #[error("{0}")]
    QueryFailed(String),
}

/// Ping a pool to check that it can reach the database.
///
/// Executes `statement` and returns the round-trip time. The first ping on a
/// fresh pool is what actually opens a connection.
pub async fn ping_pool(pool: &dyn Pool, statement: &str) -> PingResult {
    if pool.is_closed() {
        return Err(PingError::PoolClosed);
    }

    let start = Instant::now();
    match pool.query(statement).await {
        Ok(_) => Ok(start.elapsed()),
        Err(e) => Err(PingError::QueryFailed(e.to_string())),
    }
}
