//! Statement kinds, result shapes and the structured parameters each statement
//! kind forwards to a backend.

mod config;


pub use config::StatementConfig;

use crate::binding::Binding;
use crate::error::DbError;
use crate::value::Value;
use std::fmt;
use std::str::FromStr;

/// The kind of SQL statement being built or executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
    Replace,
    Create,
    Truncate,
    Drop,
}

impl QueryType {
    pub const ALL: [QueryType; 8] = [
        QueryType::Select,
        QueryType::Insert,
        QueryType::Update,
        QueryType::Delete,
        QueryType::Replace,
        QueryType::Create,
        QueryType::Truncate,
        QueryType::Drop,
    ];

    /// Match a statement keyword exactly (case-sensitive).
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == keyword)
    }

    /// Detect the statement kind from the first whitespace-delimited token.
    ///
    /// Only the leading keyword is inspected, so `CREATE TABLE` and
    /// `CREATE INDEX` are both [`QueryType::Create`].
    pub fn sniff(sql: &str) -> Option<Self> {
        sql.split_whitespace().next().and_then(Self::from_keyword)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Select => "SELECT",
            QueryType::Insert => "INSERT",
            QueryType::Update => "UPDATE",
            QueryType::Delete => "DELETE",
            QueryType::Replace => "REPLACE",
            QueryType::Create => "CREATE",
            QueryType::Truncate => "TRUNCATE",
            QueryType::Drop => "DROP",
        }
    }

    /// Row-modifying statements whose outcome is an affected-row count.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            QueryType::Insert | QueryType::Update | QueryType::Delete | QueryType::Replace
        )
    }

    /// Schema statements whose outcome is plain success.
    pub fn is_ddl(&self) -> bool {
        matches!(
            self,
            QueryType::Create | QueryType::Truncate | QueryType::Drop
        )
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested output representation of an executed statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultShape {
    /// Rows as objects with named fields.
    #[default]
    Object,
    /// Rows as ordered value sequences.
    ArrayNumeric,
    /// Rows as column-name → value mappings.
    ArrayAssoc,
    /// Number of rows returned or affected.
    Rows,
    /// Last inserted id.
    LastId,
}

impl ResultShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultShape::Object => "obj",
            ResultShape::ArrayNumeric => "array_num",
            ResultShape::ArrayAssoc => "array_assoc",
            ResultShape::Rows => "rows",
            ResultShape::LastId => "id",
        }
    }
}

impl FromStr for ResultShape {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "obj" => Ok(ResultShape::Object),
            "array_num" => Ok(ResultShape::ArrayNumeric),
            "array_assoc" => Ok(ResultShape::ArrayAssoc),
            "rows" => Ok(ResultShape::Rows),
            "id" => Ok(ResultShape::LastId),
            other => Err(DbError::query(format!("unknown result shape: {other}"))),
        }
    }
}

/// SELECT projection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Columns {
    /// `*`
    #[default]
    All,
    /// A single column or expression.
    One(String),
    /// An ordered column list, joined with `, `.
    List(Vec<String>),
}

impl Columns {
    pub fn to_sql(&self) -> String {
        match self {
            Columns::All => "*".to_string(),
            Columns::One(c) => c.clone(),
            Columns::List(cols) => cols.join(", "),
        }
    }
}

impl From<&str> for Columns {
    fn from(s: &str) -> Self {
        if s == "*" {
            Columns::All
        } else {
            Columns::One(s.to_string())
        }
    }
}

impl From<String> for Columns {
    fn from(s: String) -> Self {
        Columns::from(s.as_str())
    }
}

impl From<Vec<String>> for Columns {
    fn from(cols: Vec<String>) -> Self {
        Columns::List(cols)
    }
}

impl From<Vec<&str>> for Columns {
    fn from(cols: Vec<&str>) -> Self {
        Columns::List(cols.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Columns {
    fn from(cols: &[&str]) -> Self {
        Columns::List(cols.iter().map(|c| c.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Columns {
    fn from(cols: [&str; N]) -> Self {
        Columns::List(cols.iter().map(|c| c.to_string()).collect())
    }
}

/// WHERE or ORDER BY fragments, in caller order.
///
/// A single fragment is kept as-is; several are joined by the clause's
/// separator (`AND` for WHERE, `, ` for ORDER BY).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Clauses(pub Vec<String>);

impl Clauses {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn join(&self, separator: &str) -> String {
        self.0.join(separator)
    }
}

impl From<&str> for Clauses {
    fn from(s: &str) -> Self {
        Clauses(vec![s.to_string()])
    }
}

impl From<String> for Clauses {
    fn from(s: String) -> Self {
        Clauses(vec![s])
    }
}

impl From<Vec<String>> for Clauses {
    fn from(v: Vec<String>) -> Self {
        Clauses(v)
    }
}

impl From<Vec<&str>> for Clauses {
    fn from(v: Vec<&str>) -> Self {
        Clauses(v.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Clauses {
    fn from(v: [&str; N]) -> Self {
        Clauses(v.iter().map(|s| s.to_string()).collect())
    }
}

/// Ordered column → value data for INSERT/UPDATE/REPLACE.
pub type Data = Vec<(String, Value)>;

/// Fields forwarded for a SELECT.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectParams {
    pub columns: Columns,
    pub table: String,
    pub where_clauses: Clauses,
    pub order: Clauses,
    pub limit: Option<u64>,
    pub bindings: Option<Vec<Binding>>,
}

/// Fields forwarded for an INSERT.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InsertParams {
    pub table: String,
    pub data: Data,
    pub bindings: Option<Vec<Binding>>,
}

/// Fields forwarded for an UPDATE.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpdateParams {
    pub table: String,
    pub data: Data,
    pub bindings: Option<Vec<Binding>>,
    pub where_clauses: Clauses,
}

/// Fields forwarded for a REPLACE (emulated as probe + UPDATE/INSERT).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReplaceParams {
    pub table: String,
    pub data: Data,
    pub bindings: Option<Vec<Binding>>,
}

/// Fields forwarded for a DELETE.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeleteParams {
    pub table: String,
    pub bindings: Option<Vec<Binding>>,
    pub where_clauses: Clauses,
}

/// Fields forwarded for a CREATE TABLE.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CreateParams {
    pub table: String,
    /// Column name → type/constraint fragment.
    pub columns: Vec<(String, String)>,
    pub foreign_keys: Vec<String>,
    pub references: Vec<String>,
    pub on_tables: Vec<String>,
    pub actions: Vec<String>,
    pub engine: Option<String>,
    pub charset: Option<String>,
}

/// A fully configured statement, ready for a backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(SelectParams),
    Insert(InsertParams),
    Update(UpdateParams),
    Replace(ReplaceParams),
    Delete(DeleteParams),
    Create(CreateParams),
    Truncate { table: String },
    Drop { table: String },
}

impl Statement {
    pub fn query_type(&self) -> QueryType {
        match self {
            Statement::Select(_) => QueryType::Select,
            Statement::Insert(_) => QueryType::Insert,
            Statement::Update(_) => QueryType::Update,
            Statement::Replace(_) => QueryType::Replace,
            Statement::Delete(_) => QueryType::Delete,
            Statement::Create(_) => QueryType::Create,
            Statement::Truncate { .. } => QueryType::Truncate,
            Statement::Drop { .. } => QueryType::Drop,
        }
    }

    pub fn table(&self) -> &str {
        match self {
            Statement::Select(p) => &p.table,
            Statement::Insert(p) => &p.table,
            Statement::Update(p) => &p.table,
            Statement::Replace(p) => &p.table,
            Statement::Delete(p) => &p.table,
            Statement::Create(p) => &p.table,
            Statement::Truncate { table } | Statement::Drop { table } => table,
        }
    }
}
