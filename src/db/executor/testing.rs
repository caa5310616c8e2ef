// In-memory executor for unit tests: replays queued responses in order and
// records every statement it receives.

use super::{Connector, ExecResult, GatewayExecutor, Statement};
use crate::db_types::{ConnectionProfile, Record};
use crate::error::{GatewayError, GatewayResult};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub enum Scripted {
    Rows(Vec<Record>),
    Exec(ExecResult),
    Fail(GatewayError),
}

#[derive(Debug, Default)]
struct ScriptState {
    responses: VecDeque<Scripted>,
    statements: Vec<Statement>,
    closes: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedExecutor {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_rows(&self, rows: Vec<Value>) -> &Self {
        let rows = rows.into_iter().map(record).collect();
        self.push(Scripted::Rows(rows))
    }

    pub fn push_exec(&self, rows_affected: u64, last_insert_id: Option<u64>) -> &Self {
        self.push(Scripted::Exec(ExecResult {
            rows_affected,
            last_insert_id,
        }))
    }

    pub fn push_error(&self, error: GatewayError) -> &Self {
        self.push(Scripted::Fail(error))
    }

    fn push(&self, response: Scripted) -> &Self {
        self.state.lock().unwrap().responses.push_back(response);
        self
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.state.lock().unwrap().statements.clone()
    }

    pub fn close_count(&self) -> usize {
        self.state.lock().unwrap().closes
    }

    pub fn remaining(&self) -> usize {
        self.state.lock().unwrap().responses.len()
    }

    fn next(&self, statement: &Statement) -> Scripted {
        let mut state = self.state.lock().unwrap();
        state.statements.push(statement.clone());
        match state.responses.pop_front() {
            Some(response) => response,
            None => panic!("unexpected statement: {}", statement.sql),
        }
    }
}

/// Builds a record from a `json!({..})` object literal.
pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {}", other),
    }
}

#[async_trait::async_trait]
impl GatewayExecutor for ScriptedExecutor {
    async fn fetch_all(&mut self, statement: &Statement) -> GatewayResult<Vec<Record>> {
        match self.next(statement) {
            Scripted::Rows(rows) => Ok(rows),
            Scripted::Fail(error) => Err(error),
            Scripted::Exec(_) => panic!("expected rows for: {}", statement.sql),
        }
    }

    async fn execute(&mut self, statement: &Statement) -> GatewayResult<ExecResult> {
        match self.next(statement) {
            Scripted::Exec(result) => Ok(result),
            Scripted::Fail(error) => Err(error),
            Scripted::Rows(_) => panic!("expected exec result for: {}", statement.sql),
        }
    }

    async fn close(&mut self) {
        self.state.lock().unwrap().closes += 1;
    }
}

/// Hands out clones of one scripted session and counts opens.
#[derive(Debug, Clone, Default)]
pub struct ScriptedConnector {
    pub executor: ScriptedExecutor,
    opens: Arc<Mutex<usize>>,
    fail_with: Option<GatewayError>,
}

impl ScriptedConnector {
    pub fn new(executor: ScriptedExecutor) -> Self {
        Self {
            executor,
            ..Self::default()
        }
    }

    pub fn failing(error: GatewayError) -> Self {
        Self {
            fail_with: Some(error),
            ..Self::default()
        }
    }

    pub fn open_count(&self) -> usize {
        *self.opens.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl Connector for ScriptedConnector {
    type Session = ScriptedExecutor;

    async fn open(&self, _profile: &ConnectionProfile) -> GatewayResult<Self::Session> {
        *self.opens.lock().unwrap() += 1;
        match &self.fail_with {
            Some(error) => Err(error.clone()),
            None => Ok(self.executor.clone()),
        }
    }
}
