//! MySQL pool implementation

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use async_trait::async_trait;
use mysql_async::{Conn, Row as MySqlRow, consts::ColumnType, prelude::*};
use sqlrelay_core::{
    ColumnMeta, Pool, PoolConfig, QueryResult, Result, Row, SqlRelayError, Value,
};

use crate::escape::escape_literal;

/// Character set id MySQL reports for binary columns
const BINARY_CHARSET: u16 = 63;

/// Counts one in-flight request while alive
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(counter: &Arc<AtomicUsize>) -> (Self, usize) {
        let before = counter.fetch_add(1, Ordering::SeqCst);
        (Self(counter.clone()), before)
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A `mysql_async` pool with sqlrelay's sizing rules applied
pub struct MySqlPool {
    pool: mysql_async::Pool,
    config: PoolConfig,
    in_flight: Arc<AtomicUsize>,
    closed: AtomicBool,
}

impl MySqlPool {
    pub(crate) fn new(pool: mysql_async::Pool, config: PoolConfig) -> Self {
        Self {
            pool,
            config,
            in_flight: Arc::new(AtomicUsize::new(0)),
            closed: AtomicBool::new(false),
        }
    }

    /// Number of requests currently holding or waiting for a connection
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Get a connection from the pool.
    ///
    /// While fewer than `max_connections` requests are in flight the pool may
    /// need to open a connection, so the connect timeout applies. Beyond that
    /// the request queues behind the busy connections without a timeout,
    /// unless the queue limit or `wait_for_connections` say otherwise.
    async fn acquire(&self) -> Result<(InFlight, Conn)> {
        let (guard, ahead) = InFlight::enter(&self.in_flight);
        let max = self.config.max_connections();

        if ahead < max {
            let timeout = self.config.connect_timeout();
            let conn = tokio::time::timeout(timeout, self.pool.get_conn())
                .await
                .map_err(|_| {
                    SqlRelayError::Connection(format!("connect ETIMEDOUT after {:?}", timeout))
                })?
                .map_err(map_mysql_error)?;
            return Ok((guard, conn));
        }

        if !self.config.wait_for_connections() {
            return Err(SqlRelayError::Connection("No connections available".into()));
        }
        if let Some(limit) = self.config.queue_limit()
            && ahead - max >= limit
        {
            return Err(SqlRelayError::Connection("Queue limit reached".into()));
        }

        tracing::debug!(queued = ahead - max + 1, "waiting for a free MySQL connection");
        let conn = self.pool.get_conn().await.map_err(map_mysql_error)?;
        Ok((guard, conn))
    }
}

/// Server-side errors are query errors; everything else means the
/// connection itself is in trouble.
fn map_mysql_error(err: mysql_async::Error) -> SqlRelayError {
    match err {
        mysql_async::Error::Server(e) => SqlRelayError::Query(e.to_string()),
        other => SqlRelayError::Connection(other.to_string()),
    }
}

/// Column types whose values are raw bytes rather than text
fn is_bit_column(col_type: ColumnType) -> bool {
    matches!(
        col_type,
        ColumnType::MYSQL_TYPE_BIT | ColumnType::MYSQL_TYPE_GEOMETRY
    )
}

/// String and blob types; with the binary charset these are BINARY,
/// VARBINARY and BLOB columns. Every non-string column also reports the
/// binary charset, so the flag means nothing outside this set.
fn is_string_column(col_type: ColumnType) -> bool {
    matches!(
        col_type,
        ColumnType::MYSQL_TYPE_STRING
            | ColumnType::MYSQL_TYPE_VAR_STRING
            | ColumnType::MYSQL_TYPE_VARCHAR
            | ColumnType::MYSQL_TYPE_TINY_BLOB
            | ColumnType::MYSQL_TYPE_MEDIUM_BLOB
            | ColumnType::MYSQL_TYPE_LONG_BLOB
            | ColumnType::MYSQL_TYPE_BLOB
    )
}

/// Convert mysql_async Value to our Value type, using column type metadata
/// to correctly interpret byte strings from the text protocol.
fn mysql_value_to_value(val: mysql_async::Value, col_type: ColumnType, binary: bool) -> Value {
    match val {
        mysql_async::Value::NULL => Value::Null,
        mysql_async::Value::Bytes(bytes) => {
            if is_bit_column(col_type) || (binary && is_string_column(col_type)) {
                return Value::Bytes(bytes);
            }
            match String::from_utf8(bytes) {
                Ok(s) => text_to_value(s, col_type),
                Err(e) => Value::Bytes(e.into_bytes()),
            }
        }
        mysql_async::Value::Int(i) => Value::Int64(i),
        mysql_async::Value::UInt(u) => Value::UInt64(u),
        mysql_async::Value::Float(f) => Value::Float64(f as f64),
        mysql_async::Value::Double(d) => Value::Float64(d),
        mysql_async::Value::Date(year, month, day, hour, min, sec, micro) => {
            let date = chrono::NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32);
            match date {
                Some(date) if hour == 0 && min == 0 && sec == 0 && micro == 0 => Value::Date(date),
                Some(date) => date
                    .and_hms_micro_opt(hour as u32, min as u32, sec as u32, micro)
                    .map(Value::DateTime)
                    .unwrap_or_else(|| {
                        Value::String(format!(
                            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                            year, month, day, hour, min, sec
                        ))
                    }),
                None => Value::String(format!("{:04}-{:02}-{:02}", year, month, day)),
            }
        }
        // TIME spans -838:59:59 to 838:59:59, so it stays textual
        mysql_async::Value::Time(negative, days, hours, mins, secs, micros) => {
            let total_hours = days * 24 + (hours as u32);
            let sign = if negative { "-" } else { "" };
            Value::String(format!(
                "{}{:02}:{:02}:{:02}.{:06}",
                sign, total_hours, mins, secs, micros
            ))
        }
    }
}

/// Interpret a text-protocol value by its column type. Anything that fails
/// to parse (zero dates, out-of-range numbers) is kept as a string.
fn text_to_value(s: String, col_type: ColumnType) -> Value {
    match col_type {
        ColumnType::MYSQL_TYPE_TINY
        | ColumnType::MYSQL_TYPE_SHORT
        | ColumnType::MYSQL_TYPE_LONG
        | ColumnType::MYSQL_TYPE_INT24
        | ColumnType::MYSQL_TYPE_YEAR => {
            s.parse::<i64>().map(Value::Int64).unwrap_or(Value::String(s))
        }
        ColumnType::MYSQL_TYPE_LONGLONG => match s.parse::<i64>() {
            Ok(v) => Value::Int64(v),
            Err(_) => s.parse::<u64>().map(Value::UInt64).unwrap_or(Value::String(s)),
        },
        ColumnType::MYSQL_TYPE_FLOAT | ColumnType::MYSQL_TYPE_DOUBLE => {
            s.parse::<f64>().map(Value::Float64).unwrap_or(Value::String(s))
        }
        ColumnType::MYSQL_TYPE_DECIMAL | ColumnType::MYSQL_TYPE_NEWDECIMAL => Value::Decimal(s),
        ColumnType::MYSQL_TYPE_DATE | ColumnType::MYSQL_TYPE_NEWDATE => {
            chrono::NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .map(Value::Date)
                .unwrap_or(Value::String(s))
        }
        ColumnType::MYSQL_TYPE_DATETIME
        | ColumnType::MYSQL_TYPE_DATETIME2
        | ColumnType::MYSQL_TYPE_TIMESTAMP
        | ColumnType::MYSQL_TYPE_TIMESTAMP2 => {
            chrono::NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S%.f")
                .map(Value::DateTime)
                .unwrap_or(Value::String(s))
        }
        ColumnType::MYSQL_TYPE_JSON => serde_json::from_str(&s)
            .map(Value::Json)
            .unwrap_or(Value::String(s)),
        _ => Value::String(s),
    }
}

#[async_trait]
impl Pool for MySqlPool {
    fn driver_name(&self) -> &str {
        "mysql"
    }

    fn escape(&self, value: &Value) -> String {
        escape_literal(value)
    }

    #[tracing::instrument(skip(self, sql), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn query(&self, sql: &str) -> Result<QueryResult> {
        if self.is_closed() {
            return Err(SqlRelayError::Connection("Pool is closed".into()));
        }
        let start_time = Instant::now();

        let (_in_flight, mut conn) = self.acquire().await?;

        let result = conn.query_iter(sql).await.map_err(map_mysql_error)?;

        let mut columns = Vec::new();
        let mut column_names = Vec::new();
        let mut column_kinds = Vec::new();
        for (idx, col) in result.columns_ref().iter().enumerate() {
            let name = col.name_str().to_string();
            column_names.push(name.clone());
            column_kinds.push((col.column_type(), col.character_set() == BINARY_CHARSET));
            columns.push(ColumnMeta {
                name,
                data_type: format!("{:?}", col.column_type()),
                ordinal: idx,
            });
        }

        let affected_rows = result.affected_rows();
        let last_insert_id = result.last_insert_id();
        let warnings = result.warnings();

        // Only the first result set is returned; the rest are drained
        let mysql_rows: Vec<MySqlRow> = result.collect_and_drop().await.map_err(map_mysql_error)?;

        let rows: Vec<Row> = mysql_rows
            .into_iter()
            .map(|mysql_row| {
                let values = (0..column_names.len())
                    .map(|idx| {
                        let val: mysql_async::Value =
                            mysql_row.get(idx).unwrap_or(mysql_async::Value::NULL);
                        let (col_type, binary) = column_kinds
                            .get(idx)
                            .copied()
                            .unwrap_or((ColumnType::MYSQL_TYPE_STRING, false));
                        mysql_value_to_value(val, col_type, binary)
                    })
                    .collect();
                Row::new(column_names.clone(), values)
            })
            .collect();

        let execution_time_ms = start_time.elapsed().as_millis() as u64;
        tracing::debug!(
            row_count = rows.len(),
            affected_rows,
            execution_time_ms,
            "query executed successfully"
        );

        Ok(QueryResult {
            columns,
            rows,
            affected_rows,
            last_insert_id,
            warnings,
            execution_time_ms,
        })
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            tracing::debug!("MySQL pool already closed");
            return Ok(());
        }
        tracing::info!("closing MySQL connection pool");
        self.pool
            .clone()
            .disconnect()
            .await
            .map_err(|e| SqlRelayError::Connection(format!("Failed to close MySQL pool: {}", e)))
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
