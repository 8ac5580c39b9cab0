//! In-memory pool used by the unit tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Once};

use async_trait::async_trait;
use parking_lot::Mutex;
use sqlrelay_core::{
    ColumnMeta, ConnectionState, Pool, PoolConfig, PoolFactory, QueryResult, Result, Row,
    ServerConfig, SqlRelayError, StateListener, Value,
};
use tokio::time::Instant;

static INIT: Once = Once::new();

/// Route tracing output through the test harness. `RUST_LOG` overrides the
/// default filter.
pub fn init_tracing() {
    INIT.call_once(|| {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "sqlrelay_connection=debug".into()),
            )
            .with_test_writer()
            .finish();

        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

/// Listener that keeps every state it is given
#[derive(Default)]
pub struct StateRecorder {
    states: Mutex<Vec<ConnectionState>>,
}

impl StateRecorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn states(&self) -> Vec<ConnectionState> {
        self.states.lock().clone()
    }
}

impl StateListener for StateRecorder {
    fn on_state(&self, state: &ConnectionState) {
        self.states.lock().push(state.clone());
    }
}

/// Records every statement it receives and fails on demand
pub struct MockPool {
    started: Instant,
    executed: Mutex<Vec<(String, std::time::Duration)>>,
    failure: Mutex<Option<String>>,
    closed: AtomicBool,
    close_calls: AtomicUsize,
}

impl MockPool {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            started: Instant::now(),
            executed: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
            closed: AtomicBool::new(false),
            close_calls: AtomicUsize::new(0),
        })
    }

    /// Make every following statement fail with `message`
    pub fn fail_with(&self, message: &str) {
        *self.failure.lock() = Some(message.to_string());
    }

    pub fn recover(&self) {
        *self.failure.lock() = None;
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().iter().map(|(sql, _)| sql.clone()).collect()
    }

    /// Offsets from pool creation at which `statement` ran
    pub fn times_of(&self, statement: &str) -> Vec<std::time::Duration> {
        self.executed
            .lock()
            .iter()
            .filter(|(sql, _)| sql == statement)
            .map(|(_, at)| *at)
            .collect()
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Pool for MockPool {
    fn driver_name(&self) -> &str {
        "mock"
    }

    fn escape(&self, value: &Value) -> String {
        match value {
            Value::String(s) => format!("'{}'", s.replace('\'', "\\'")),
            other => other.to_string(),
        }
    }

    async fn query(&self, sql: &str) -> Result<QueryResult> {
        self.executed
            .lock()
            .push((sql.to_string(), self.started.elapsed()));

        if let Some(message) = self.failure.lock().clone() {
            return Err(SqlRelayError::Connection(message));
        }

        Ok(QueryResult {
            columns: vec![ColumnMeta {
                name: "value".into(),
                data_type: "VAR_STRING".into(),
                ordinal: 0,
            }],
            rows: vec![Row::new(vec!["value".into()], vec![Value::from("8.0.36")])],
            ..QueryResult::default()
        })
    }

    async fn close(&self) -> Result<()> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Hands out one shared [`MockPool`] and counts how often it was asked to
pub struct MockFactory {
    pub pool: Arc<MockPool>,
    created: AtomicUsize,
    refuse: AtomicBool,
}

impl MockFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            pool: MockPool::new(),
            created: AtomicUsize::new(0),
            refuse: AtomicBool::new(false),
        })
    }

    pub fn refuse(&self) {
        self.refuse.store(true, Ordering::SeqCst);
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl PoolFactory for MockFactory {
    fn create(&self, _server: &ServerConfig, _config: &PoolConfig) -> Result<Arc<dyn Pool>> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(SqlRelayError::Configuration("bad pool options".into()));
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        let pool: Arc<dyn Pool> = self.pool.clone();
        Ok(pool)
    }
}
