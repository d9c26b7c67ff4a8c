//! SQLite backend built on `rusqlite`.

use super::{Backend, ConnectOptions, RawResponse};
use crate::binding::{Binding, Marker};
use crate::error::{DbError, DbResult};
use crate::render::Dialect;
use crate::row::ResultSet;
use crate::statement::QueryType;
use crate::value::Value;
use rusqlite::types::{Value as SqlValue, ValueRef};

/// An embedded SQLite database.
///
/// `ConnectOptions::db_name` is the file path; empty or `:memory:` opens an
/// in-memory database. Host, user and password are ignored. Both `:name` and
/// `?` markers are understood natively.
#[derive(Debug, Default)]
pub struct SqliteBackend {
    conn: Option<rusqlite::Connection>,
    error: String,
}

impl SqliteBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an in-memory database.
    pub fn in_memory() -> DbResult<Self> {
        let mut backend = Self::new();
        backend.connect(&ConnectOptions::new(":memory:"))?;
        Ok(backend)
    }

    /// The underlying connection, for driver-specific work.
    pub fn connection(&self) -> Option<&rusqlite::Connection> {
        self.conn.as_ref()
    }

    fn conn(&self) -> DbResult<&rusqlite::Connection> {
        self.conn
            .as_ref()
            .ok_or_else(|| DbError::query("not connected"))
    }

    fn record<T>(&mut self, result: rusqlite::Result<T>) -> DbResult<T> {
        result.map_err(|err| {
            self.error = err.to_string();
            DbError::from(err)
        })
    }
}

fn value_from_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Int(v),
        ValueRef::Real(v) => Value::Float(v),
        ValueRef::Text(text) => Value::Text(String::from_utf8_lossy(text).into_owned()),
        ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
    }
}

fn convert_value(value: Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(v) => SqlValue::Integer(i64::from(v)),
        Value::Int(v) => SqlValue::Integer(v),
        Value::Float(v) => SqlValue::Real(v),
        Value::Text(v) => SqlValue::Text(v),
        Value::Blob(v) => SqlValue::Blob(v),
    }
}

/// Step a prepared statement: collect rows if it has columns, else execute.
fn step(stmt: &mut rusqlite::Statement<'_>) -> rusqlite::Result<RawResponse> {
    let column_count = stmt.column_count();
    if column_count == 0 {
        return Ok(RawResponse::Affected(stmt.raw_execute()? as u64));
    }

    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect();
    let mut rows = stmt.raw_query();
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(column_count);
        for i in 0..column_count {
            values.push(value_from_ref(row.get_ref(i)?));
        }
        out.push(values);
    }
    Ok(RawResponse::ResultSet(ResultSet::new(columns, out)))
}

fn run_raw(conn: &rusqlite::Connection, sql: &str, hint: QueryType) -> rusqlite::Result<RawResponse> {
    if hint.is_ddl() {
        conn.execute_batch(sql)?;
        return Ok(RawResponse::Done);
    }
    let mut stmt = conn.prepare(sql)?;
    step(&mut stmt)
}

/// SQLite index of the `position`-th anonymous `?`, or of an explicit `?NNN`.
///
/// Named parameters take index slots too, so the n-th `?` is not index n once
/// `:name` markers precede it.
fn positional_index(stmt: &rusqlite::Statement<'_>, position: usize) -> rusqlite::Result<usize> {
    let explicit = format!("?{position}");
    if let Some(index) = stmt.parameter_index(&explicit)? {
        return Ok(index);
    }
    position
        .checked_sub(1)
        .and_then(|skip| {
            (1..=stmt.parameter_count())
                .filter(|&i| stmt.parameter_name(i).is_none())
                .nth(skip)
        })
        .ok_or(rusqlite::Error::InvalidParameterName(explicit))
}

fn run_bound(
    conn: &rusqlite::Connection,
    sql: &str,
    bindings: &[Binding],
) -> rusqlite::Result<RawResponse> {
    let mut stmt = conn.prepare(sql)?;
    for binding in bindings {
        let index = match &binding.marker {
            Marker::Named(name) => stmt
                .parameter_index(name)?
                .ok_or_else(|| rusqlite::Error::InvalidParameterName(name.clone()))?,
            Marker::Positional(position) => positional_index(&stmt, *position)?,
        };
        stmt.raw_bind_parameter(index, convert_value(binding.bound_value()))?;
    }
    step(&mut stmt)
}

impl Backend for SqliteBackend {
    fn kind(&self) -> &'static str {
        "sqlite"
    }

    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn connect(&mut self, options: &ConnectOptions) -> DbResult<()> {
        let path = match options.db_name.as_str() {
            "" => ":memory:",
            path => path,
        };
        match rusqlite::Connection::open(path) {
            Ok(conn) => {
                tracing::debug!(path, "opened sqlite database");
                self.conn = Some(conn);
                self.error.clear();
                Ok(())
            }
            Err(err) => {
                self.error = err.to_string();
                Err(DbError::connection(self.error.clone()))
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    fn raw_execute(&mut self, sql: &str, hint: QueryType) -> DbResult<RawResponse> {
        let result = run_raw(self.conn()?, sql, hint);
        self.record(result)
    }

    fn bound_execute(&mut self, sql: &str, bindings: &[Binding]) -> DbResult<RawResponse> {
        let result = run_bound(self.conn()?, sql, bindings);
        self.record(result)
    }

    fn last_insert_id(&self) -> i64 {
        self.conn
            .as_ref()
            .map(rusqlite::Connection::last_insert_rowid)
            .unwrap_or(0)
    }

    fn error_text(&self) -> &str {
        &self.error
    }

    fn release(&mut self) {
        if let Some(conn) = self.conn.take()
            && let Err((_, err)) = conn.close()
        {
            tracing::warn!(error = %err, "failed to close sqlite connection");
        }
    }
}
