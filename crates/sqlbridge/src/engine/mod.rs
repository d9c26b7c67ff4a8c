//! The query engine: a fluent statement builder bound to one backend.
//!
//! Builder methods mutate the engine's [`StatementConfig`] and return
//! `&mut Self`; `execute` (or `query`) runs the statement, resets the
//! configuration and returns a [`QueryOutput`] in the requested shape.
//!
//! ```ignore
//! use sqlbridge::prelude::*;
//!
//! let mut db = Engine::new(SqliteBackend::in_memory()?);
//! db.insert(data! { "name" => "Isis", "email" => "isis@example.com" })
//!     .in_table("users")
//!     .execute()?;
//!
//! let rows = db
//!     .select(["id", "name"])
//!     .from("users")
//!     .where_("id >= 1")
//!     .order("id DESC")
//!     .limit(10)
//!     .execute_as(ResultShape::ArrayAssoc)?
//!     .into_assoc()?;
//! ```
//!
//! An engine is not meant to be driven from several threads at once: the
//! statement under construction is plain mutable state. Share it behind a
//! lock (as [`crate::ConnectionRegistry`] does) and build one statement at a
//! time.

#[cfg(test)]
mod tests;

use crate::backend::{Backend, ConnectOptions, RawResponse};
use crate::binding::Binding;
use crate::error::{DbError, DbResult};
use crate::monitor::{InstrumentedBackend, QueryHook};
use crate::row::QueryOutput;
use crate::statement::{Clauses, Columns, QueryType, ResultShape, StatementConfig};
use crate::value::Value;
use std::sync::Arc;

/// Fluent statement builder and executor.
#[derive(Debug)]
pub struct Engine {
    backend: InstrumentedBackend,
    config: StatementConfig,
    last_insert_id: i64,
    row_count: u64,
}

impl Engine {
    /// Wrap an already connected backend.
    pub fn new<B: Backend + 'static>(backend: B) -> Self {
        Self::from_boxed(Box::new(backend))
    }

    pub fn from_boxed(backend: Box<dyn Backend>) -> Self {
        Self {
            backend: InstrumentedBackend::new(backend),
            config: StatementConfig::new(),
            last_insert_id: 0,
            row_count: 0,
        }
    }

    /// Connect `backend` and wrap it.
    ///
    /// Fails with `DbError::Connection` carrying the backend's error text when
    /// connecting fails or the backend does not report itself connected.
    pub fn connect(mut backend: Box<dyn Backend>, options: &ConnectOptions) -> DbResult<Self> {
        let connected = backend.connect(options);
        match connected {
            Ok(()) if backend.is_connected() => Ok(Self::from_boxed(backend)),
            Ok(()) => {
                let text = backend.error_text().to_string();
                backend.release();
                Err(DbError::connection(text))
            }
            Err(err) => {
                backend.release();
                Err(match err {
                    DbError::Connection(_) => err,
                    other => DbError::connection(other.to_string()),
                })
            }
        }
    }

    /// Add a query hook.
    pub fn with_hook<H: QueryHook + 'static>(self, hook: H) -> Self {
        self.with_hook_arc(Arc::new(hook))
    }

    /// Add a query hook from an `Arc`.
    pub fn with_hook_arc(mut self, hook: Arc<dyn QueryHook>) -> Self {
        self.backend.add_hook_arc(hook);
        self
    }

    pub fn add_hook_arc(&mut self, hook: Arc<dyn QueryHook>) {
        self.backend.add_hook_arc(hook);
    }

    pub(crate) fn set_identifier(&mut self, identifier: &str) {
        self.backend.set_identifier(identifier);
    }

    /// Registry identifier, for engines handed out by a registry.
    pub fn identifier(&self) -> Option<&str> {
        self.backend.identifier()
    }

    // ---------------------------------------------------------------------
    // Statement kinds
    // ---------------------------------------------------------------------

    /// CREATE TABLE with `column → type/constraint` definitions.
    pub fn create<I, K, V>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.config.query_type = Some(QueryType::Create);
        self.config.column_defs = columns
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// SELECT `columns` (`"*"`, a single column, or a list).
    pub fn select(&mut self, columns: impl Into<Columns>) -> &mut Self {
        self.config.query_type = Some(QueryType::Select);
        self.config.columns = columns.into();
        self
    }

    pub fn insert<I, K, V>(&mut self, data: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.set_data(QueryType::Insert, data, None)
    }

    /// INSERT whose values are markers bound by `bindings`.
    pub fn insert_with<I, K, V>(&mut self, data: I, bindings: Vec<Binding>) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.set_data(QueryType::Insert, data, Some(bindings))
    }

    pub fn update<I, K, V>(&mut self, data: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.set_data(QueryType::Update, data, None)
    }

    pub fn update_with<I, K, V>(&mut self, data: I, bindings: Vec<Binding>) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.set_data(QueryType::Update, data, Some(bindings))
    }

    /// UPDATE the row whose first data column matches, INSERT otherwise.
    ///
    /// The first data column is taken as the identity column; list it first.
    pub fn replace<I, K, V>(&mut self, data: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.set_data(QueryType::Replace, data, None)
    }

    pub fn replace_with<I, K, V>(&mut self, data: I, bindings: Vec<Binding>) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.set_data(QueryType::Replace, data, Some(bindings))
    }

    pub fn delete(&mut self) -> &mut Self {
        self.config.query_type = Some(QueryType::Delete);
        self
    }

    pub fn truncate(&mut self) -> &mut Self {
        self.config.query_type = Some(QueryType::Truncate);
        self
    }

    /// DROP TABLE IF EXISTS.
    pub fn drop_table(&mut self) -> &mut Self {
        self.config.query_type = Some(QueryType::Drop);
        self
    }

    fn set_data<I, K, V>(
        &mut self,
        query_type: QueryType,
        data: I,
        bindings: Option<Vec<Binding>>,
    ) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.config.query_type = Some(query_type);
        self.config.data = data
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.config.set_bindings(bindings);
        self
    }

    // ---------------------------------------------------------------------
    // Clauses
    // ---------------------------------------------------------------------

    /// Set the target table. Same as [`Engine::in_table`] and [`Engine::from`].
    pub fn table(&mut self, name: impl Into<String>) -> &mut Self {
        self.config.table = Some(name.into());
        self
    }

    pub fn in_table(&mut self, name: impl Into<String>) -> &mut Self {
        self.table(name)
    }

    pub fn from(&mut self, name: impl Into<String>) -> &mut Self {
        self.table(name)
    }

    /// WHERE fragment(s); several fragments are AND-joined.
    pub fn where_(&mut self, clause: impl Into<Clauses>) -> &mut Self {
        self.config.where_clauses = clause.into().0;
        self
    }

    /// WHERE with bindings appended after any bindings already given.
    pub fn where_with(&mut self, clause: impl Into<Clauses>, bindings: Vec<Binding>) -> &mut Self {
        self.config.where_clauses = clause.into().0;
        self.config.merge_bindings(Some(bindings));
        self
    }

    /// ORDER BY fragment(s); several fragments are comma-joined.
    pub fn order(&mut self, clause: impl Into<Clauses>) -> &mut Self {
        self.config.order = clause.into().0;
        self
    }

    pub fn limit(&mut self, n: u64) -> &mut Self {
        self.config.limit = Some(n);
        self
    }

    // CREATE options. Foreign keys pair up by position.

    pub fn foreign_key(&mut self, column: impl Into<String>) -> &mut Self {
        self.config.foreign_keys.push(column.into());
        self
    }

    pub fn reference(&mut self, column: impl Into<String>) -> &mut Self {
        self.config.references.push(column.into());
        self
    }

    pub fn on(&mut self, table: impl Into<String>) -> &mut Self {
        self.config.on_tables.push(table.into());
        self
    }

    pub fn on_action(&mut self, clause: impl Into<String>) -> &mut Self {
        self.config.actions.push(clause.into());
        self
    }

    pub fn engine(&mut self, name: impl Into<String>) -> &mut Self {
        self.config.engine = Some(name.into());
        self
    }

    pub fn charset(&mut self, name: impl Into<String>) -> &mut Self {
        self.config.charset = Some(name.into());
        self
    }

    // ---------------------------------------------------------------------
    // Execution
    // ---------------------------------------------------------------------

    /// Execute the configured statement, returning OBJECT rows for SELECT.
    pub fn execute(&mut self) -> DbResult<QueryOutput> {
        self.execute_as(ResultShape::Object)
    }

    /// Execute the configured statement with an explicit result shape.
    ///
    /// The configuration is reset whether or not execution succeeds.
    pub fn execute_as(&mut self, shape: ResultShape) -> DbResult<QueryOutput> {
        self.config.result_shape = shape;
        let statement = self.config.to_statement();
        self.config.reset();
        let statement = statement?;
        let query_type = statement.query_type();

        tracing::debug!(
            target: "sqlbridge::engine",
            query_type = query_type.as_str(),
            table = statement.table(),
            shape = shape.as_str(),
            identifier = self.identifier().unwrap_or("-"),
            "dispatching statement"
        );

        let raw = self.backend.execute_statement(&statement)?;
        self.normalize(query_type, raw, shape)
    }

    /// Run raw SQL. The statement kind is the first word of `sql`.
    pub fn query(&mut self, sql: &str) -> DbResult<QueryOutput> {
        self.query_as(sql, None, ResultShape::Object)
    }

    /// Run raw SQL with bindings.
    pub fn query_with(&mut self, sql: &str, bindings: Vec<Binding>) -> DbResult<QueryOutput> {
        self.query_as(sql, Some(bindings), ResultShape::Object)
    }

    /// Run raw SQL with optional bindings and an explicit result shape.
    ///
    /// An unrecognized leading keyword fails with `UnknownQueryType` before
    /// anything else happens; the current configuration is left as it was.
    pub fn query_as(
        &mut self,
        sql: &str,
        bindings: Option<Vec<Binding>>,
        shape: ResultShape,
    ) -> DbResult<QueryOutput> {
        let query_type = QueryType::sniff(sql).ok_or_else(|| {
            DbError::UnknownQueryType(sql.split_whitespace().next().unwrap_or("").to_string())
        })?;
        self.config.reset();

        tracing::debug!(
            target: "sqlbridge::engine",
            query_type = query_type.as_str(),
            bound = bindings.as_ref().is_some_and(|b| !b.is_empty()),
            shape = shape.as_str(),
            identifier = self.identifier().unwrap_or("-"),
            "dispatching raw query"
        );

        let raw = match bindings {
            Some(bindings) if !bindings.is_empty() => self.backend.bound_execute(sql, &bindings),
            _ => self.backend.raw_execute(sql, query_type),
        }?;
        self.normalize(query_type, raw, shape)
    }

    fn normalize(
        &mut self,
        query_type: QueryType,
        raw: RawResponse,
        shape: ResultShape,
    ) -> DbResult<QueryOutput> {
        self.last_insert_id = self.backend.last_insert_id();
        self.row_count = self.backend.row_count(&raw);

        if query_type.is_write() {
            return Ok(match shape {
                ResultShape::LastId => QueryOutput::LastId(self.last_insert_id),
                _ => QueryOutput::Count(self.row_count),
            });
        }
        if query_type.is_ddl() {
            return Ok(QueryOutput::Done(true));
        }

        match (shape, raw) {
            (ResultShape::Rows, RawResponse::ResultSet(_)) => Ok(QueryOutput::Count(self.row_count)),
            (ResultShape::Rows, RawResponse::Affected(n)) => Ok(QueryOutput::Count(n)),
            (ResultShape::Rows, RawResponse::Done) => Ok(QueryOutput::Done(true)),
            (ResultShape::LastId, _) => Ok(QueryOutput::LastId(self.last_insert_id)),
            (shape, raw) => self.backend.fetch(raw, shape),
        }
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    /// Last insert id observed after the most recent execution.
    pub fn last_insert_id(&self) -> i64 {
        self.last_insert_id
    }

    /// Rows returned or affected by the most recent execution.
    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    /// The statement under construction.
    pub fn config(&self) -> &StatementConfig {
        &self.config
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.inner()
    }

    pub fn backend_mut(&mut self) -> &mut dyn Backend {
        self.backend.inner_mut()
    }

    pub fn is_connected(&self) -> bool {
        self.backend.is_connected()
    }

    pub fn error_text(&self) -> &str {
        self.backend.error_text()
    }

    /// Release the backend's driver handle. Idempotent.
    pub fn release(&mut self) {
        self.backend.release();
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.backend.release();
    }
}
