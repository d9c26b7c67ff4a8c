use crate::statement::QueryType;
use std::fmt;
use std::time::Duration;

/// Context information about the statement being executed.
#[derive(Debug, Clone)]
pub struct QueryContext {
    /// The SQL handed to the backend.
    pub sql: String,
    /// Number of bound parameters.
    pub param_count: usize,
    /// Statement kind, when the SQL starts with a known keyword.
    pub query_type: Option<QueryType>,
    /// Registry identifier of the engine running the statement.
    pub identifier: Option<String>,
}

impl QueryContext {
    /// Create a new query context; the query type is sniffed from `sql`.
    pub fn new(sql: &str, param_count: usize) -> Self {
        Self {
            sql: sql.to_string(),
            param_count,
            query_type: QueryType::sniff(sql),
            identifier: None,
        }
    }

    /// Override the sniffed query type.
    pub fn with_query_type(mut self, query_type: QueryType) -> Self {
        self.query_type = Some(query_type);
        self
    }

    pub fn with_identifier(mut self, identifier: Option<String>) -> Self {
        self.identifier = identifier;
        self
    }
}

/// Maximum length for error messages in `QueryResult::Error`.
const MAX_ERROR_LEN: usize = 512;

/// Outcome of a statement, as seen by hooks.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// Statement returned rows.
    Rows(usize),
    /// Statement affected rows.
    Affected(u64),
    /// Statement completed without a row outcome.
    Done,
    /// Statement failed (message truncated to 512 bytes).
    Error(String),
}

impl QueryResult {
    /// Create an error result, truncating long messages.
    pub fn error(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        if msg.len() > MAX_ERROR_LEN {
            Self::Error(format!(
                "{}...",
                super::truncate_sql_bytes(&msg, MAX_ERROR_LEN)
            ))
        } else {
            Self::Error(msg)
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, QueryResult::Error(_))
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryResult::Rows(n) => write!(f, "{n} rows"),
            QueryResult::Affected(n) => write!(f, "{n} affected"),
            QueryResult::Done => write!(f, "done"),
            QueryResult::Error(e) => write!(f, "error: {e}"),
        }
    }
}

/// Action to take after a hook inspects a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookAction {
    /// Run the statement.
    Continue,
    /// Refuse to run the statement; the caller gets `DbError::HookAborted`.
    Abort(String),
}

/// Trait for hooking into statement execution.
///
/// Hooks run for every raw or bound execution a backend performs, including
/// the probe SELECT of an emulated REPLACE.
pub trait QueryHook: Send + Sync {
    /// Called before a statement is executed.
    fn before_query(&self, ctx: &QueryContext) -> HookAction {
        let _ = ctx;
        HookAction::Continue
    }

    /// Called after a statement completes, successfully or not.
    fn after_query(&self, _ctx: &QueryContext, _duration: Duration, _result: &QueryResult) {}
}
