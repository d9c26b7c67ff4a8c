//! Dialect SQL rendering.
//!
//! Every function here is pure: it turns statement parameters into SQL text and
//! never touches a connection. Backends call these from their per-statement
//! methods and hand the result to raw or bound execution.
//!
//! Rendering rules shared by all dialects:
//!
//! - only the table name is quoted; columns, WHERE and ORDER BY fragments are
//!   caller SQL and pass through untouched
//! - WHERE fragments are joined with ` AND `, ORDER BY fragments with `, `
//! - data values are literal-quoted when the statement has no bindings and
//!   emitted raw (so markers stay markers) when it does


use crate::binding::{Binding, binding_for};
use crate::error::{DbError, DbResult};
use crate::statement::{
    Clauses, CreateParams, Data, DeleteParams, InsertParams, ReplaceParams, SelectParams,
    UpdateParams,
};
use crate::value::Value;
use std::fmt::Write as _;

/// SQL dialect understood by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    MySql,
    Sqlite,
    Postgres,
}

impl Dialect {
    pub fn name(&self) -> &'static str {
        match self {
            Dialect::MySql => "mysql",
            Dialect::Sqlite => "sqlite",
            Dialect::Postgres => "postgres",
        }
    }

    fn quote_char(&self) -> char {
        match self {
            Dialect::MySql => '`',
            Dialect::Sqlite | Dialect::Postgres => '"',
        }
    }

    /// Quote a (possibly dotted) identifier. Parts already quoted are kept.
    pub fn quote_ident(&self, name: &str) -> String {
        let q = self.quote_char();
        name.split('.')
            .map(|part| {
                if part.len() >= 2 && part.starts_with(q) && part.ends_with(q) {
                    part.to_string()
                } else {
                    let escaped = part.replace(q, &format!("{q}{q}"));
                    format!("{q}{escaped}{q}")
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }
}

fn has_bindings(bindings: &Option<Vec<Binding>>) -> bool {
    bindings.as_ref().is_some_and(|b| !b.is_empty())
}

fn render_value(value: &Value, bound: bool) -> String {
    if bound {
        value.to_raw_sql()
    } else {
        value.to_sql_literal()
    }
}

fn push_where(sql: &mut String, where_clauses: &Clauses) {
    if !where_clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&where_clauses.join(" AND "));
    }
}

pub fn render_select(dialect: Dialect, p: &SelectParams) -> String {
    let mut sql = format!(
        "SELECT {} FROM {}",
        p.columns.to_sql(),
        dialect.quote_ident(&p.table)
    );
    push_where(&mut sql, &p.where_clauses);
    if !p.order.is_empty() {
        sql.push_str(" ORDER BY ");
        sql.push_str(&p.order.join(", "));
    }
    if let Some(limit) = p.limit {
        let _ = write!(sql, " LIMIT {limit}");
    }
    sql
}

fn render_insert_data(dialect: Dialect, table: &str, data: &Data, bound: bool) -> String {
    let columns: Vec<&str> = data.iter().map(|(c, _)| c.as_str()).collect();
    let values: Vec<String> = data.iter().map(|(_, v)| render_value(v, bound)).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        dialect.quote_ident(table),
        columns.join(", "),
        values.join(", ")
    )
}

pub fn render_insert(dialect: Dialect, p: &InsertParams) -> String {
    render_insert_data(dialect, &p.table, &p.data, has_bindings(&p.bindings))
}

fn render_update_data(
    dialect: Dialect,
    table: &str,
    data: &Data,
    bound: bool,
    where_clauses: &Clauses,
) -> String {
    let assignments: Vec<String> = data
        .iter()
        .map(|(c, v)| format!("{c}={}", render_value(v, bound)))
        .collect();
    let mut sql = format!(
        "UPDATE {} SET {}",
        dialect.quote_ident(table),
        assignments.join(", ")
    );
    push_where(&mut sql, where_clauses);
    sql
}

pub fn render_update(dialect: Dialect, p: &UpdateParams) -> String {
    render_update_data(
        dialect,
        &p.table,
        &p.data,
        has_bindings(&p.bindings),
        &p.where_clauses,
    )
}

pub fn render_delete(dialect: Dialect, p: &DeleteParams) -> String {
    let mut sql = format!("DELETE FROM {}", dialect.quote_ident(&p.table));
    push_where(&mut sql, &p.where_clauses);
    sql
}

pub fn render_truncate(dialect: Dialect, table: &str) -> String {
    match dialect {
        Dialect::Sqlite => format!("DELETE FROM {}", dialect.quote_ident(table)),
        Dialect::MySql | Dialect::Postgres => {
            format!("TRUNCATE TABLE {}", dialect.quote_ident(table))
        }
    }
}

pub fn render_drop(dialect: Dialect, table: &str) -> String {
    format!("DROP TABLE IF EXISTS {}", dialect.quote_ident(table))
}

/// Render CREATE TABLE, including foreign keys and storage options.
///
/// For SQLite and Postgres the foreign-key indexes follow as separate
/// `CREATE INDEX IF NOT EXISTS` statements, separated by `;\n`.
pub fn render_create(dialect: Dialect, p: &CreateParams) -> String {
    let mut parts: Vec<String> = p
        .columns
        .iter()
        .map(|(column, definition)| format!("{column} {definition}"))
        .collect();
    let mut trailing = Vec::new();

    let fk_count = p.foreign_keys.len();
    let has_fks = fk_count > 0 || !p.references.is_empty() || !p.on_tables.is_empty();
    if has_fks {
        if fk_count == p.references.len() && fk_count == p.on_tables.len() {
            for (i, column) in p.foreign_keys.iter().enumerate() {
                let action = p.actions.get(i).or_else(|| p.actions.first());
                let target = format!("{}({})", p.on_tables[i], p.references[i]);
                let index_name = format!("idx_{}_{column}", p.table.replace('.', "_"));

                let fk = match dialect {
                    Dialect::MySql => {
                        parts.push(format!("INDEX idx_{column} ({column})"));
                        format!("CONSTRAINT FOREIGN KEY ({column}) REFERENCES {target}")
                    }
                    Dialect::Postgres | Dialect::Sqlite => {
                        trailing.push(format!(
                            "CREATE INDEX IF NOT EXISTS {} ON {} ({column})",
                            dialect.quote_ident(&index_name),
                            dialect.quote_ident(&p.table)
                        ));
                        format!(
                            "CONSTRAINT fk_{}_{column} FOREIGN KEY ({column}) REFERENCES {target}",
                            p.table.replace('.', "_")
                        )
                    }
                };
                parts.push(match action {
                    Some(action) => format!("{fk} {action}"),
                    None => fk,
                });
            }
        } else {
            tracing::warn!(
                table = %p.table,
                foreign_keys = fk_count,
                references = p.references.len(),
                on_tables = p.on_tables.len(),
                "foreign key lists differ in length; skipping foreign key clauses"
            );
        }
    }

    let mut sql = format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        dialect.quote_ident(&p.table),
        parts.join(", ")
    );

    match dialect {
        Dialect::MySql => {
            if let Some(engine) = &p.engine {
                let _ = write!(sql, " ENGINE={engine}");
            }
            if let Some(charset) = &p.charset {
                let _ = write!(sql, " CHARSET={charset}");
            }
        }
        Dialect::Sqlite | Dialect::Postgres => {
            if p.engine.is_some() || p.charset.is_some() {
                tracing::debug!(
                    dialect = dialect.name(),
                    table = %p.table,
                    "ignoring ENGINE/CHARSET options"
                );
            }
        }
    }

    for statement in trailing {
        sql.push_str(";\n");
        sql.push_str(&statement);
    }
    sql
}

/// The column and value a REPLACE uses to probe for an existing row.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaceIdentity {
    pub column: String,
    pub value: Value,
}

/// Resolve the REPLACE identity: the first data column.
///
/// When the first data value is a marker with a matching binding, the bound
/// value is used so the probe compares against real data.
pub fn replace_identity(p: &ReplaceParams) -> DbResult<ReplaceIdentity> {
    let (column, value) = p
        .data
        .first()
        .ok_or_else(|| DbError::query("REPLACE requires at least one data column"))?;

    let resolved = match (&p.bindings, value.as_text()) {
        (Some(bindings), Some(placeholder)) => binding_for(bindings, placeholder, 1)
            .map(Binding::bound_value)
            .unwrap_or_else(|| value.clone()),
        _ => value.clone(),
    };

    Ok(ReplaceIdentity {
        column: column.clone(),
        value: resolved,
    })
}

/// `SELECT <id> FROM <table> WHERE <id> = <literal> LIMIT 1`
pub fn render_replace_probe(dialect: Dialect, table: &str, identity: &ReplaceIdentity) -> String {
    format!(
        "SELECT {col} FROM {} WHERE {col} = {} LIMIT 1",
        dialect.quote_ident(table),
        identity.value.to_sql_literal(),
        col = identity.column
    )
}

/// UPDATE half of a REPLACE: all data, restricted to the identity row.
pub fn render_replace_update(
    dialect: Dialect,
    p: &ReplaceParams,
    identity: &ReplaceIdentity,
) -> String {
    let where_clauses = Clauses::from(format!(
        "{} = {}",
        identity.column,
        identity.value.to_sql_literal()
    ));
    render_update_data(
        dialect,
        &p.table,
        &p.data,
        has_bindings(&p.bindings),
        &where_clauses,
    )
}

/// INSERT half of a REPLACE: all data, identity included.
pub fn render_replace_insert(dialect: Dialect, p: &ReplaceParams) -> String {
    render_insert_data(dialect, &p.table, &p.data, has_bindings(&p.bindings))
}
