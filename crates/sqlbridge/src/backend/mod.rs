//! The backend contract and its concrete implementations.
//!
//! A [`Backend`] owns one driver connection. It implements a handful of
//! primitives (connect, raw and bound execution, metadata accessors); the
//! per-statement methods are provided by the trait and render SQL through
//! [`Backend::dialect`] before delegating to those primitives.

#[cfg(feature = "postgres")]
mod markers;
#[cfg(feature = "postgres")]
mod postgres;
#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "postgres")]
pub use postgres::PostgresBackend;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteBackend;

use crate::binding::Binding;
use crate::error::DbResult;
use crate::render::{self, Dialect};
use crate::row::{QueryOutput, ResultSet};
use crate::statement::{
    CreateParams, DeleteParams, InsertParams, QueryType, ReplaceParams, ResultShape,
    SelectParams, Statement, UpdateParams,
};

/// What a backend hands back after executing a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResponse {
    /// Rows produced by a row-returning statement.
    ResultSet(ResultSet),
    /// Rows affected by a write.
    Affected(u64),
    /// A statement with no row outcome (DDL, batches).
    Done,
}

/// Connection parameters.
///
/// `db_name` is the database name for server backends and the file path for
/// SQLite (`:memory:` or empty for an in-memory database).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectOptions {
    pub host: String,
    pub user: String,
    pub db_name: String,
    pub password: String,
    pub charset: Option<String>,
    pub port: Option<u16>,
}

impl ConnectOptions {
    pub fn new(db_name: impl Into<String>) -> Self {
        Self {
            db_name: db_name.into(),
            ..Default::default()
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }
}

/// A SQL backend bound to one driver connection.
///
/// Failed executions return `DbError::QueryExecution` carrying the driver's
/// message verbatim; the same message is kept for [`Backend::error_text`].
pub trait Backend: Send {
    /// Registry name of this backend kind (`"sqlite"`, `"postgres"`, ...).
    fn kind(&self) -> &'static str;

    fn dialect(&self) -> Dialect;

    fn connect(&mut self, options: &ConnectOptions) -> DbResult<()>;

    fn is_connected(&self) -> bool;

    /// Execute SQL without parameters. `hint` tells read from write from DDL.
    fn raw_execute(&mut self, sql: &str, hint: QueryType) -> DbResult<RawResponse>;

    /// Prepare `sql`, bind every binding (type hints applied) and execute.
    fn bound_execute(&mut self, sql: &str, bindings: &[Binding]) -> DbResult<RawResponse>;

    /// Id generated by the most recent successful INSERT on this connection.
    fn last_insert_id(&self) -> i64;

    /// Last driver error message, empty if none.
    fn error_text(&self) -> &str;

    /// Drop the driver handle. Safe to call repeatedly or after a failed connect.
    fn release(&mut self);

    /// Rows returned or affected.
    fn row_count(&self, response: &RawResponse) -> u64 {
        match response {
            RawResponse::ResultSet(rs) => rs.len() as u64,
            RawResponse::Affected(n) => *n,
            RawResponse::Done => 0,
        }
    }

    /// Shape a row-returning response. Anything else yields empty rows.
    fn fetch(&self, response: RawResponse, shape: ResultShape) -> DbResult<QueryOutput> {
        let rs = match response {
            RawResponse::ResultSet(rs) => rs,
            RawResponse::Affected(_) | RawResponse::Done => ResultSet::default(),
        };
        Ok(match shape {
            ResultShape::ArrayNumeric => QueryOutput::Numeric(rs.into_numeric()),
            ResultShape::ArrayAssoc => QueryOutput::Assoc(rs.into_assoc()),
            ResultShape::Object | ResultShape::Rows | ResultShape::LastId => {
                QueryOutput::Objects(rs.into_objects())
            }
        })
    }

    /// Run rendered SQL, bound when there is anything to bind.
    fn run(
        &mut self,
        sql: &str,
        hint: QueryType,
        bindings: Option<&[Binding]>,
    ) -> DbResult<RawResponse> {
        match bindings {
            Some(bindings) if !bindings.is_empty() => self.bound_execute(sql, bindings),
            _ => self.raw_execute(sql, hint),
        }
    }

    fn select(&mut self, params: &SelectParams) -> DbResult<RawResponse> {
        let sql = render::render_select(self.dialect(), params);
        self.run(&sql, QueryType::Select, params.bindings.as_deref())
    }

    fn insert(&mut self, params: &InsertParams) -> DbResult<RawResponse> {
        let sql = render::render_insert(self.dialect(), params);
        self.run(&sql, QueryType::Insert, params.bindings.as_deref())
    }

    fn update(&mut self, params: &UpdateParams) -> DbResult<RawResponse> {
        let sql = render::render_update(self.dialect(), params);
        self.run(&sql, QueryType::Update, params.bindings.as_deref())
    }

    /// Probe by the first data column, then UPDATE the match or INSERT.
    fn replace(&mut self, params: &ReplaceParams) -> DbResult<RawResponse> {
        let dialect = self.dialect();
        let identity = render::replace_identity(params)?;
        let probe = render::render_replace_probe(dialect, &params.table, &identity);
        let found = self.raw_execute(&probe, QueryType::Select)?;

        if self.row_count(&found) > 0 {
            let sql = render::render_replace_update(dialect, params, &identity);
            self.run(&sql, QueryType::Update, params.bindings.as_deref())
        } else {
            let sql = render::render_replace_insert(dialect, params);
            self.run(&sql, QueryType::Insert, params.bindings.as_deref())
        }
    }

    fn delete(&mut self, params: &DeleteParams) -> DbResult<RawResponse> {
        let sql = render::render_delete(self.dialect(), params);
        self.run(&sql, QueryType::Delete, params.bindings.as_deref())
    }

    fn create(&mut self, params: &CreateParams) -> DbResult<RawResponse> {
        let sql = render::render_create(self.dialect(), params);
        self.raw_execute(&sql, QueryType::Create)
    }

    fn truncate(&mut self, table: &str) -> DbResult<RawResponse> {
        let sql = render::render_truncate(self.dialect(), table);
        self.raw_execute(&sql, QueryType::Truncate)
    }

    /// `drop` would collide with `Drop::drop` through smart pointers.
    fn drop_table(&mut self, table: &str) -> DbResult<RawResponse> {
        let sql = render::render_drop(self.dialect(), table);
        self.raw_execute(&sql, QueryType::Drop)
    }

    /// Dispatch a statement to its per-kind method.
    fn execute_statement(&mut self, statement: &Statement) -> DbResult<RawResponse> {
        match statement {
            Statement::Select(p) => self.select(p),
            Statement::Insert(p) => self.insert(p),
            Statement::Update(p) => self.update(p),
            Statement::Replace(p) => self.replace(p),
            Statement::Delete(p) => self.delete(p),
            Statement::Create(p) => self.create(p),
            Statement::Truncate { table } => self.truncate(table),
            Statement::Drop { table } => self.drop_table(table),
        }
    }
}
