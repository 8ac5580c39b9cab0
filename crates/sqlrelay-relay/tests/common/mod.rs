//! Common test utilities and mocks

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Once};

use async_trait::async_trait;
use parking_lot::Mutex;
use sqlrelay_core::{
    ColumnMeta, Pool, PoolConfig, PoolFactory, QueryResult, Result, Row, ServerConfig,
    SqlRelayError, Value,
};
use sqlrelay_relay::{Message, NodeStatus, RelayHost};

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "sqlrelay_relay=debug,sqlrelay_connection=debug".into()),
            )
            .with_test_writer()
            .finish();

        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

/// Mock pool for testing relay logic without a real database.
///
/// Every statement other than the liveness probe returns `rows`, or fails
/// while `should_fail` is set.
pub struct MockPool {
    pub rows: Mutex<Vec<Row>>,
    pub should_fail: AtomicBool,
    /// Log of all SQL executed, probes included
    pub query_log: Mutex<Vec<String>>,
}

impl MockPool {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            rows: Mutex::new(vec![Row::new(vec!["id".into()], vec![Value::Int64(5)])]),
            should_fail: AtomicBool::new(false),
            query_log: Mutex::new(Vec::new()),
        })
    }

    /// Statements executed, without the liveness probes
    pub fn statements(&self) -> Vec<String> {
        self.query_log
            .lock()
            .iter()
            .filter(|sql| sql.as_str() != "SELECT version();")
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Pool for MockPool {
    fn driver_name(&self) -> &str {
        "mock"
    }

    fn escape(&self, value: &Value) -> String {
        match value {
            Value::String(s) => format!("'{}'", s),
            other => other.to_string(),
        }
    }

    async fn query(&self, sql: &str) -> Result<QueryResult> {
        self.query_log.lock().push(sql.to_string());

        if sql == "SELECT version();" {
            return Ok(QueryResult::default());
        }
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(SqlRelayError::Query(
                "ER_NO_SUCH_TABLE: Table 'shop.t' doesn't exist".into(),
            ));
        }

        Ok(QueryResult {
            columns: vec![ColumnMeta {
                name: "id".into(),
                data_type: "LONGLONG".into(),
                ordinal: 0,
            }],
            rows: self.rows.lock().clone(),
            ..QueryResult::default()
        })
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }

    fn is_closed(&self) -> bool {
        false
    }
}

pub struct MockFactory {
    pub pool: Arc<MockPool>,
    pub created: AtomicUsize,
}

impl MockFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            pool: MockPool::new(),
            created: AtomicUsize::new(0),
        })
    }
}

impl PoolFactory for MockFactory {
    fn create(&self, _server: &ServerConfig, _config: &PoolConfig) -> Result<Arc<dyn Pool>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        let pool: Arc<dyn Pool> = self.pool.clone();
        Ok(pool)
    }
}

/// Everything a relay told its host, in order
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Status(NodeStatus),
    Send(Message),
    Error(String, Option<Message>),
}

#[derive(Default)]
pub struct RecordingHost {
    pub events: Mutex<Vec<HostEvent>>,
}

impl RecordingHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.events.lock().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                HostEvent::Error(error, _) => Some(error.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn sent(&self) -> Vec<Message> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                HostEvent::Send(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn last_status(&self) -> Option<NodeStatus> {
        self.events
            .lock()
            .iter()
            .rev()
            .find_map(|event| match event {
                HostEvent::Status(status) => Some(status.clone()),
                _ => None,
            })
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl RelayHost for RecordingHost {
    fn status(&self, status: NodeStatus) {
        self.events.lock().push(HostEvent::Status(status));
    }

    fn send(&self, message: Message) {
        self.events.lock().push(HostEvent::Send(message));
    }

    fn error(&self, error: &SqlRelayError, message: Option<&Message>) {
        self.events
            .lock()
            .push(HostEvent::Error(error.to_string(), message.cloned()));
    }
}
