// =====================================================
// MySQL DRIVER BINDING
// Short-lived sessions, parameter binding and row decoding
// =====================================================

use std::future::Future;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as base64_engine, Engine as _};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::{json, Value};
use sqlx::mysql::{MySqlArguments, MySqlConnectOptions, MySqlConnection, MySqlDatabaseError, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column, ConnectOptions, Connection, MySql, Row, TypeInfo, ValueRef};

use crate::config::GatewayConfig;
use crate::db::executor::{Connector, ExecResult, GatewayExecutor, Statement};
use crate::db::normalize::format_datetime;
use crate::db_types::{ConnectionProfile, Record};
use crate::error::{GatewayError, GatewayResult};

// --- Connection ---

pub fn connect_options(profile: &ConnectionProfile) -> MySqlConnectOptions {
    let mut options = MySqlConnectOptions::new()
        .host(&profile.host)
        .port(profile.port)
        .username(&profile.username);

    if let Some(pwd) = &profile.password {
        options = options.password(pwd);
    }

    if let Some(db) = &profile.database {
        if !db.is_empty() {
            options = options.database(db);
        }
    }

    options.log_statements(log::LevelFilter::Debug)
}

/// Turns a failed connect into a message that names the endpoint.
pub fn describe_connect_error(err_msg: &str, profile: &ConnectionProfile, limit: Duration) -> String {
    if err_msg.contains("os error 111") || err_msg.contains("Connection refused") {
        return format!(
            "Connection Refused ({})\n\nCheck if MySQL is running on {}:{}",
            err_msg, profile.host, profile.port
        );
    }
    if err_msg.contains("timed out") {
        return format!(
            "Connection Timed Out\n\nThe server at {}:{} did not respond within {} seconds.",
            profile.host,
            profile.port,
            limit.as_secs()
        );
    }
    format!("Connection failed: {}", err_msg)
}

#[derive(Debug, Clone, Default)]
pub struct MySqlConnector {
    config: GatewayConfig,
}

impl MySqlConnector {
    pub fn new(config: GatewayConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl Connector for MySqlConnector {
    type Session = MySqlSession;

    async fn open(&self, profile: &ConnectionProfile) -> GatewayResult<MySqlSession> {
        let options = connect_options(profile);
        let limit = self.config.connect_timeout();

        let conn = match tokio::time::timeout(limit, options.connect()).await {
            Ok(Ok(conn)) => conn,
            Ok(Err(e)) => {
                return Err(GatewayError::ConnectionFailed(describe_connect_error(
                    &e.to_string(),
                    profile,
                    limit,
                )))
            }
            Err(_) => {
                return Err(GatewayError::ConnectionFailed(describe_connect_error(
                    "timed out",
                    profile,
                    limit,
                )))
            }
        };

        log::debug!("Opened MySQL session {}:{}", profile.host, profile.port);
        Ok(MySqlSession::new(conn, self.config.query_timeout()))
    }
}

// --- Session ---

/// One live connection. Dropping it releases the socket even if `close`
/// was never reached.
pub struct MySqlSession {
    conn: Option<MySqlConnection>,
    query_timeout: Duration,
}

impl MySqlSession {
    pub fn new(conn: MySqlConnection, query_timeout: Duration) -> Self {
        Self {
            conn: Some(conn),
            query_timeout,
        }
    }

    fn connection(&mut self) -> GatewayResult<&mut MySqlConnection> {
        self.conn
            .as_mut()
            .ok_or_else(|| GatewayError::ConnectionFailed("Session is closed".to_string()))
    }
}

fn bind_params<'q>(
    mut query: Query<'q, MySql, MySqlArguments>,
    params: &[Value],
) -> Query<'q, MySql, MySqlArguments> {
    for value in params {
        query = match value {
            Value::Null => query.bind(None::<String>),
            Value::Bool(b) => query.bind(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    query.bind(i)
                } else if let Some(u) = n.as_u64() {
                    query.bind(u)
                } else {
                    query.bind(n.as_f64().unwrap_or_default())
                }
            }
            Value::String(s) => query.bind(s.clone()),
            Value::Object(_) | Value::Array(_) => query.bind(sqlx::types::Json(value.clone())),
        };
    }
    query.persistent(false)
}

async fn with_timeout<T, F>(limit: Duration, fut: F) -> GatewayResult<T>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(classify_sqlx_error),
        Err(_) => Err(GatewayError::ExecutionFailed(format!(
            "Query timed out after {} seconds",
            limit.as_secs()
        ))),
    }
}

#[async_trait::async_trait]
impl GatewayExecutor for MySqlSession {
    async fn fetch_all(&mut self, statement: &Statement) -> GatewayResult<Vec<Record>> {
        let limit = self.query_timeout;
        let conn = self.connection()?;
        let query = bind_params(sqlx::query(&statement.sql), &statement.params);
        let rows = with_timeout(limit, query.fetch_all(conn)).await?;
        Ok(rows.iter().map(decode_row).collect())
    }

    async fn execute(&mut self, statement: &Statement) -> GatewayResult<ExecResult> {
        let limit = self.query_timeout;
        let conn = self.connection()?;
        let query = bind_params(sqlx::query(&statement.sql), &statement.params);
        let done = with_timeout(limit, query.execute(conn)).await?;
        Ok(ExecResult {
            rows_affected: done.rows_affected(),
            last_insert_id: Some(done.last_insert_id()).filter(|id| *id != 0),
        })
    }

    async fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err(e) = conn.close().await {
                log::debug!("MySQL session close failed: {}", e);
            }
        }
    }
}

// --- Errors ---

pub fn classify_sqlx_error(err: sqlx::Error) -> GatewayError {
    match err {
        sqlx::Error::Database(db_err) => {
            let number = db_err
                .try_downcast_ref::<MySqlDatabaseError>()
                .map(|e| e.number().to_string())
                .or_else(|| db_err.code().map(|code| code.to_string()));
            match number {
                Some(code) => GatewayError::ExecutionFailed(format!("{} ({})", db_err.message(), code)),
                None => GatewayError::ExecutionFailed(db_err.message().to_string()),
            }
        }
        sqlx::Error::Io(e) => GatewayError::ConnectionFailed(format!("I/O error: {}", e)),
        sqlx::Error::Tls(e) => GatewayError::ConnectionFailed(format!("TLS error: {}", e)),
        sqlx::Error::Protocol(msg) => GatewayError::ConnectionFailed(format!("Protocol error: {}", msg)),
        sqlx::Error::PoolTimedOut => {
            GatewayError::ConnectionFailed("Timed out waiting for a connection".to_string())
        }
        sqlx::Error::PoolClosed => GatewayError::ConnectionFailed("Connection pool closed".to_string()),
        other => GatewayError::ExecutionFailed(other.to_string()),
    }
}

// --- Row Decoding ---

fn decode_row(row: &MySqlRow) -> Record {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let value = decode_cell(row, i, column.type_info().name());
            (column.name().to_string(), value)
        })
        .collect()
}

fn bytes_to_value(bytes: Vec<u8>) -> Value {
    match String::from_utf8(bytes) {
        Ok(text) => Value::String(text),
        Err(e) => Value::String(base64_engine.encode(e.into_bytes())),
    }
}

fn decode_cell(row: &MySqlRow, i: usize, type_name: &str) -> Value {
    match row.try_get_raw(i) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Err(_) => return Value::Null,
        _ => {}
    }

    let decoded = match type_name {
        "BOOLEAN" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => row
            .try_get_unchecked::<i64, _>(i)
            .map(|v| json!(v))
            .ok(),
        name if name.ends_with("UNSIGNED") => row
            .try_get_unchecked::<u64, _>(i)
            .map(|v| json!(v))
            .ok(),
        "FLOAT" | "DOUBLE" => row
            .try_get_unchecked::<f64, _>(i)
            .map(|v| json!(v))
            .or_else(|_| row.try_get_unchecked::<f32, _>(i).map(|v| json!(v)))
            .ok(),
        "DATE" => row
            .try_get_unchecked::<NaiveDate, _>(i)
            .map(|v| json!(v.format("%Y-%m-%d").to_string()))
            .ok(),
        "TIME" => row
            .try_get_unchecked::<NaiveTime, _>(i)
            .map(|v| json!(v.format("%H:%M:%S").to_string()))
            .ok(),
        "DATETIME" | "TIMESTAMP" => row
            .try_get_unchecked::<NaiveDateTime, _>(i)
            .map(|v| json!(format_datetime(&v)))
            .ok(),
        "JSON" => row
            .try_get_unchecked::<sqlx::types::Json<Value>, _>(i)
            .map(|v| v.0)
            .ok(),
        "BIT" => row
            .try_get_unchecked::<Vec<u8>, _>(i)
            .map(|bytes| json!(bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b))))
            .ok(),
        "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BINARY" | "VARBINARY" => row
            .try_get_unchecked::<Vec<u8>, _>(i)
            .map(bytes_to_value)
            .ok(),
        _ => None,
    };

    // DECIMAL and text-like types, plus anything the typed decode missed.
    decoded
        .or_else(|| row.try_get_unchecked::<String, _>(i).map(Value::String).ok())
        .or_else(|| row.try_get_unchecked::<Vec<u8>, _>(i).map(bytes_to_value).ok())
        .unwrap_or_else(|| {
            log::warn!("Could not decode column {} of type {}", i, type_name);
            Value::Null
        })
}
