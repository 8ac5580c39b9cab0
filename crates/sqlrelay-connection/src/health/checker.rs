//! Liveness configuration and probe bookkeeping

use std::time::{Duration, Instant};

use sqlrelay_core::ConnectionState;

/// Statement used to probe MySQL; cheap and always succeeds on a live server
pub const DEFAULT_PROBE_STATEMENT: &str = "SELECT version();";

/// Configuration for liveness probing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LivenessConfig {
    /// Delay before the next probe after a successful one
    interval: Duration,
    /// Delay before the next probe after a failure, or after any query
    retry_interval: Duration,
    /// Statement executed by the probe
    statement: String,
}

impl LivenessConfig {
    /// Create a new liveness configuration.
    pub fn new(interval: Duration, retry_interval: Duration) -> Self {
        Self {
            interval,
            retry_interval,
            statement: DEFAULT_PROBE_STATEMENT.to_string(),
        }
    }

    /// Set the probe statement.
    pub fn with_statement(mut self, statement: impl Into<String>) -> Self {
        self.statement = statement.into();
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn retry_interval(&self) -> Duration {
        self.retry_interval
    }

    pub fn statement(&self) -> &str {
        &self.statement
    }

    /// Delay until the next probe, given whether the last one succeeded.
    pub fn next_delay(&self, succeeded: bool) -> Duration {
        if succeeded {
            self.interval
        } else {
            self.retry_interval
        }
    }
}

impl Default for LivenessConfig {
    /// Default: probe every 30s while healthy, every 5s otherwise
    fn default() -> Self {
        Self::new(Duration::from_secs(30), Duration::from_secs(5))
    }
}

/// Outcome of the most recent probe
#[derive(Debug, Clone)]
pub struct ProbeReport {
    /// State emitted for this probe
    pub state: ConnectionState,
    /// Latency of the probe, if successful
    pub latency: Option<Duration>,
    /// When the probe finished
    pub checked_at: Instant,
    /// Number of consecutive failed probes (0 if this one succeeded)
    pub consecutive_failures: u32,
}

impl ProbeReport {
    pub fn success(latency: Duration) -> Self {
        Self {
            state: ConnectionState::Connected,
            latency: Some(latency),
            checked_at: Instant::now(),
            consecutive_failures: 0,
        }
    }

    pub fn failure(error: String, consecutive_failures: u32) -> Self {
        Self {
            state: ConnectionState::Error(error),
            latency: None,
            checked_at: Instant::now(),
            consecutive_failures,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.state.is_connected()
    }
}
