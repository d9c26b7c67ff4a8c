//! A scripted in-process backend for unit tests.

use crate::backend::{Backend, ConnectOptions, RawResponse};
use crate::binding::Binding;
use crate::error::{DbError, DbResult};
use crate::render::Dialect;
use crate::row::ResultSet;
use crate::statement::QueryType;
use crate::value::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Executed {
    pub sql: String,
    pub bindings: Vec<Binding>,
}

#[derive(Debug, Default)]
pub(crate) struct Script {
    pub executed: Vec<Executed>,
    pub responses: VecDeque<DbResult<RawResponse>>,
    pub released: usize,
}

/// Records every statement and answers from a queue of scripted responses.
///
/// With an empty queue a SELECT gets an empty result set and anything else
/// affects one row.
#[derive(Debug, Clone)]
pub(crate) struct MockBackend {
    pub script: Arc<Mutex<Script>>,
    pub dialect: Dialect,
    pub last_id: i64,
    error: String,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            script: Arc::default(),
            dialect: Dialect::Sqlite,
            last_id: 7,
            error: String::new(),
        }
    }

    pub fn respond(&self, response: DbResult<RawResponse>) -> &Self {
        self.script.lock().unwrap().responses.push_back(response);
        self
    }

    pub fn respond_rows(&self, columns: &[&str], rows: Vec<Vec<Value>>) -> &Self {
        let columns = columns.iter().map(|c| c.to_string()).collect();
        self.respond(Ok(RawResponse::ResultSet(ResultSet::new(columns, rows))))
    }

    pub fn executed(&self) -> Vec<Executed> {
        self.script.lock().unwrap().executed.clone()
    }

    pub fn sql(&self) -> Vec<String> {
        self.executed().into_iter().map(|e| e.sql).collect()
    }

    pub fn released(&self) -> usize {
        self.script.lock().unwrap().released
    }

    fn answer(&mut self, sql: &str, bindings: &[Binding]) -> DbResult<RawResponse> {
        let mut script = self.script.lock().unwrap();
        script.executed.push(Executed {
            sql: sql.to_string(),
            bindings: bindings.to_vec(),
        });
        let response = script.responses.pop_front().unwrap_or_else(|| {
            Ok(match QueryType::sniff(sql) {
                Some(QueryType::Select) => RawResponse::ResultSet(ResultSet::default()),
                Some(t) if t.is_ddl() => RawResponse::Done,
                _ => RawResponse::Affected(1),
            })
        });
        if let Err(DbError::QueryExecution(message)) = &response {
            self.error = message.clone();
        }
        response
    }
}

impl Backend for MockBackend {
    fn kind(&self) -> &'static str {
        "mock"
    }

    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn connect(&mut self, _options: &ConnectOptions) -> DbResult<()> {
        Ok(())
    }

    fn is_connected(&self) -> bool {
        true
    }

    fn raw_execute(&mut self, sql: &str, _hint: QueryType) -> DbResult<RawResponse> {
        self.answer(sql, &[])
    }

    fn bound_execute(&mut self, sql: &str, bindings: &[Binding]) -> DbResult<RawResponse> {
        self.answer(sql, bindings)
    }

    fn last_insert_id(&self) -> i64 {
        self.last_id
    }

    fn error_text(&self) -> &str {
        &self.error
    }

    fn release(&mut self) {
        self.script.lock().unwrap().released += 1;
    }
}
