// =====================================================
// STATEMENT EXECUTOR
// Driver-agnostic seam between statement builders and a live connection
// =====================================================

use crate::db_types::{ConnectionProfile, Record};
use crate::error::GatewayResult;
use serde_json::Value;

/// SQL text plus positionally bound parameters. Caller input only ever
/// reaches the engine through `params`.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: u64,
    /// `None` when the engine reported no generated key.
    pub last_insert_id: Option<u64>,
}

/// One open session. Statements run sequentially on it.
#[async_trait::async_trait]
pub trait GatewayExecutor: Send {
    async fn fetch_all(&mut self, statement: &Statement) -> GatewayResult<Vec<Record>>;

    async fn execute(&mut self, statement: &Statement) -> GatewayResult<ExecResult>;

    async fn fetch_optional(&mut self, statement: &Statement) -> GatewayResult<Option<Record>> {
        Ok(self.fetch_all(statement).await?.into_iter().next())
    }

    /// Releases the session. Calling it twice is a no-op.
    async fn close(&mut self) {}
}

#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    type Session: GatewayExecutor;

    async fn open(&self, profile: &ConnectionProfile) -> GatewayResult<Self::Session>;
}

// --- Record field access ---
// Catalog rows come back with driver-dependent shapes (text, numbers, bytes
// decoded as text), so reads are tolerant.

pub fn record_text(record: &Record, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

pub fn record_u64(record: &Record, key: &str) -> Option<u64> {
    match record.get(key)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_i64().and_then(|v| u64::try_from(v).ok()))
            .or_else(|| n.as_f64().filter(|v| *v >= 0.0).map(|v| v as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        Value::Bool(b) => Some(u64::from(*b)),
        _ => None,
    }
}

#[cfg(test)]
pub mod testing;
