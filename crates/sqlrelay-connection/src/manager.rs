//! Connection manager owning the shared pool and its liveness state

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use sqlrelay_core::{
    ConnectionState, ListenerId, Params, Pool, PoolConfig, PoolFactory, QueryResult, Result,
    ServerConfig, SqlRelayError, StateBroadcaster, StateListener, format_named,
    unmatched_placeholders,
};

use crate::health::{LivenessConfig, LivenessTimer, ProbeReport, ping_pool};

/// Manages one database pool shared by any number of relays.
///
/// The pool is created on the first [`connect`](Self::connect) and probed on
/// a single resettable timer: every 30 seconds while the database answers,
/// every 5 seconds while it doesn't, and 5 seconds after any query. State
/// changes are broadcast to subscribed listeners.
pub struct ConnectionManager {
    me: Weak<ConnectionManager>,
    server: ServerConfig,
    pool_config: PoolConfig,
    liveness: LivenessConfig,
    factory: Arc<dyn PoolFactory>,
    pool: Mutex<Option<Arc<dyn Pool>>>,
    timer: Arc<LivenessTimer>,
    probe_lock: tokio::sync::Mutex<()>,
    events: StateBroadcaster,
    last_probe: Mutex<Option<ProbeReport>>,
    consecutive_failures: AtomicU32,
    shut_down: AtomicBool,
}

impl ConnectionManager {
    /// Create a manager with default pool and liveness settings
    pub fn new(server: ServerConfig, factory: Arc<dyn PoolFactory>) -> Arc<Self> {
        Self::with_config(
            server,
            PoolConfig::default(),
            LivenessConfig::default(),
            factory,
        )
    }

    pub fn with_config(
        server: ServerConfig,
        pool_config: PoolConfig,
        liveness: LivenessConfig,
        factory: Arc<dyn PoolFactory>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            server,
            pool_config,
            liveness,
            factory,
            pool: Mutex::new(None),
            timer: LivenessTimer::new(),
            probe_lock: tokio::sync::Mutex::new(()),
            events: StateBroadcaster::new(),
            last_probe: Mutex::new(None),
            consecutive_failures: AtomicU32::new(0),
            shut_down: AtomicBool::new(false),
        })
    }

    pub fn server(&self) -> &ServerConfig {
        &self.server
    }

    pub fn pool_config(&self) -> &PoolConfig {
        &self.pool_config
    }

    pub fn liveness(&self) -> &LivenessConfig {
        &self.liveness
    }

    /// Create the pool and run the first probe.
    ///
    /// Calling this again once the pool exists has no effect, as does
    /// calling it after [`shutdown`](Self::shutdown).
    #[tracing::instrument(skip(self), fields(server = %self.server.target()))]
    pub async fn connect(&self) -> Result<()> {
        if self.is_shut_down() {
            tracing::debug!("manager shut down, ignoring connect");
            return Ok(());
        }

        let created = {
            let mut slot = self.pool.lock();
            if slot.is_some() {
                tracing::debug!("pool already created");
                return Ok(());
            }
            self.factory
                .create(&self.server, &self.pool_config)
                .inspect(|pool| *slot = Some(pool.clone()))
        };

        self.events.notify(ConnectionState::Connecting);

        if let Err(e) = created {
            tracing::error!(error = %e, "failed to create pool");
            self.events.notify(ConnectionState::Error(e.to_string()));
            return Err(e);
        }

        tracing::info!("pool created, probing database");
        self.probe().await;
        Ok(())
    }

    /// Execute a statement, substituting `:name` placeholders from `params`.
    ///
    /// Every call pushes the next liveness probe to 5 seconds out, whether
    /// the statement succeeds or not.
    #[tracing::instrument(
        skip(self, statement, params),
        fields(sql_preview = %statement.chars().take(100).collect::<String>())
    )]
    pub async fn query(&self, statement: &str, params: Option<&Params>) -> Result<QueryResult> {
        let pool = self.current_pool().ok_or(SqlRelayError::NotConnected)?;

        if let Some(params) = params {
            let unmatched = unmatched_placeholders(statement, params);
            if !unmatched.is_empty() {
                tracing::debug!(?unmatched, "placeholders without a parameter left as written");
            }
        }
        let sql = format_named(statement, params, |value| pool.escape(value));

        self.schedule_probe(self.liveness.retry_interval());

        let result = pool.query(&sql).await;
        match &result {
            Ok(r) => tracing::debug!(rows = r.row_count(), "query finished"),
            Err(e) => tracing::warn!(error = %e, "query failed"),
        }
        result
    }

    /// Stop probing, close the pool and report idle.
    ///
    /// Safe to call more than once and without a prior connect; the pool is
    /// closed at most once.
    #[tracing::instrument(skip(self), fields(server = %self.server.target()))]
    pub async fn shutdown(&self) {
        self.shut_down.store(true, Ordering::SeqCst);
        self.timer.close();
        // An in-flight probe sees the flag once it finishes and stays quiet
        let _probe = self.probe_lock.lock().await;

        let pool = self.pool.lock().take();
        if let Some(pool) = pool {
            tracing::info!("closing pool");
            if let Err(e) = pool.close().await {
                tracing::warn!(error = %e, "error while closing pool");
            }
        }

        self.events.notify(ConnectionState::Idle);
    }

    /// Register a listener for state changes
    pub fn subscribe(&self, listener: Arc<dyn StateListener>) -> ListenerId {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Most recently emitted state
    pub fn state(&self) -> ConnectionState {
        self.events.latest()
    }

    pub fn listener_count(&self) -> usize {
        self.events.listener_count()
    }

    pub fn is_connected(&self) -> bool {
        self.pool.lock().is_some()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// Outcome of the most recent probe
    pub fn last_probe(&self) -> Option<ProbeReport> {
        self.last_probe.lock().clone()
    }

    /// The liveness timer, exposed for inspection
    pub fn timer(&self) -> &LivenessTimer {
        &self.timer
    }

    fn current_pool(&self) -> Option<Arc<dyn Pool>> {
        self.pool.lock().clone()
    }

    fn schedule_probe(&self, delay: Duration) {
        let manager = self.me.clone();
        self.timer.reset(delay, async move {
            if let Some(manager) = manager.upgrade() {
                manager.probe().await;
            }
        });
    }

    async fn probe(&self) {
        let _guard = self.probe_lock.lock().await;
        let Some(pool) = self.current_pool() else {
            return;
        };

        let outcome = ping_pool(pool.as_ref(), self.liveness.statement()).await;
        if self.is_shut_down() {
            tracing::debug!("probe finished after shutdown, discarding");
            return;
        }

        let report = match outcome {
            Ok(latency) => {
                let previous = self.consecutive_failures.swap(0, Ordering::SeqCst);
                if previous > 0 {
                    tracing::info!(failures = previous, "database reachable again");
                }
                tracing::trace!(?latency, "probe succeeded");
                ProbeReport::success(latency)
            }
            Err(e) => {
                let failures = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
                tracing::warn!(error = %e, failures, "probe failed");
                ProbeReport::failure(e.to_string(), failures)
            }
        };

        let delay = self.liveness.next_delay(report.succeeded());
        self.events.notify(report.state.clone());
        *self.last_probe.lock() = Some(report);
        self.schedule_probe(delay);
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.timer.close();
    }
}
