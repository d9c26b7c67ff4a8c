//! Result sets, rows and the normalized query output.

use crate::error::{DbError, DbResult};
use crate::value::{FromValue, Value};
use indexmap::IndexMap;
use serde::Serialize;
use serde::ser::SerializeMap;
use std::ops::Index;
use std::sync::Arc;

/// A materialized result set as returned by a backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows with named field access.
    pub fn into_objects(self) -> Vec<Row> {
        let columns: Arc<[String]> = self.columns.into();
        self.rows
            .into_iter()
            .map(|values| Row {
                columns: Arc::clone(&columns),
                values,
            })
            .collect()
    }

    /// Rows as plain ordered values.
    pub fn into_numeric(self) -> Vec<Vec<Value>> {
        self.rows
    }

    /// Rows as column-name → value maps, in column order.
    ///
    /// With duplicate column names the last occurrence wins.
    pub fn into_assoc(self) -> Vec<AssocRow> {
        let columns = self.columns;
        self.rows
            .into_iter()
            .map(|values| columns.iter().cloned().zip(values).collect())
            .collect()
    }
}

/// An associative row: column name → value, in column order.
pub type AssocRow = IndexMap<String, Value>;

/// A row with named fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The raw value of `column`, if present.
    pub fn value(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .rposition(|c| c == column)
            .and_then(|i| self.values.get(i))
    }

    /// Decode `column` into `T`, returning `DbError::Decode` on failure.
    pub fn try_get<T: FromValue>(&self, column: &str) -> DbResult<T> {
        let value = self
            .value(column)
            .ok_or_else(|| DbError::decode(column, "no such column"))?;
        T::from_value(value).map_err(|message| DbError::decode(column, message))
    }

    /// Decode `column` into `T`, treating a missing column as `None`.
    pub fn get<T: FromValue>(&self, column: &str) -> Option<T> {
        self.value(column).and_then(|v| T::from_value(v).ok())
    }

    pub fn into_assoc(self) -> AssocRow {
        self.columns.iter().cloned().zip(self.values).collect()
    }
}

impl Index<&str> for Row {
    type Output = Value;

    fn index(&self, column: &str) -> &Value {
        match self.value(column) {
            Some(v) => v,
            None => panic!("no column named {column:?} in row"),
        }
    }
}

impl Index<usize> for Row {
    type Output = Value;

    fn index(&self, i: usize) -> &Value {
        &self.values[i]
    }
}

impl Serialize for Row {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (column, value) in self.columns.iter().zip(&self.values) {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// Trait for converting an OBJECT-shape row into a Rust struct.
///
/// Usually derived with `#[derive(FromRow)]`:
///
/// ```ignore
/// use sqlbridge::FromRow;
///
/// #[derive(FromRow)]
/// struct User {
///     id: i64,
///     name: String,
///     #[sqlbridge(column = "email")]
///     mail: Option<String>,
/// }
/// ```
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> DbResult<Self>;
}

impl FromRow for Row {
    fn from_row(row: &Row) -> DbResult<Self> {
        Ok(row.clone())
    }
}

impl FromRow for AssocRow {
    fn from_row(row: &Row) -> DbResult<Self> {
        Ok(row.clone().into_assoc())
    }
}

/// The normalized result of `execute`/`query`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryOutput {
    /// OBJECT rows.
    Objects(Vec<Row>),
    /// ARRAY_NUMERIC rows.
    Numeric(Vec<Vec<Value>>),
    /// ARRAY_ASSOC rows.
    Assoc(Vec<AssocRow>),
    /// Affected or returned row count.
    Count(u64),
    /// Last inserted id.
    LastId(i64),
    /// Success of a schema statement.
    Done(bool),
}

impl QueryOutput {
    /// The row count, for `Count` outputs; row-returning outputs report their length.
    pub fn count(&self) -> Option<u64> {
        match self {
            QueryOutput::Count(n) => Some(*n),
            QueryOutput::Objects(rows) => Some(rows.len() as u64),
            QueryOutput::Numeric(rows) => Some(rows.len() as u64),
            QueryOutput::Assoc(rows) => Some(rows.len() as u64),
            QueryOutput::LastId(_) | QueryOutput::Done(_) => None,
        }
    }

    pub fn last_id(&self) -> Option<i64> {
        match self {
            QueryOutput::LastId(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, QueryOutput::Done(true))
    }

    pub fn into_objects(self) -> DbResult<Vec<Row>> {
        match self {
            QueryOutput::Objects(rows) => Ok(rows),
            other => Err(shape_mismatch("obj", &other)),
        }
    }

    pub fn into_numeric(self) -> DbResult<Vec<Vec<Value>>> {
        match self {
            QueryOutput::Numeric(rows) => Ok(rows),
            other => Err(shape_mismatch("array_num", &other)),
        }
    }

    pub fn into_assoc(self) -> DbResult<Vec<AssocRow>> {
        match self {
            QueryOutput::Assoc(rows) => Ok(rows),
            other => Err(shape_mismatch("array_assoc", &other)),
        }
    }

    /// Map OBJECT rows into `T`.
    pub fn into_typed<T: FromRow>(self) -> DbResult<Vec<T>> {
        self.into_objects()?.iter().map(T::from_row).collect()
    }

    fn kind(&self) -> &'static str {
        match self {
            QueryOutput::Objects(_) => "obj",
            QueryOutput::Numeric(_) => "array_num",
            QueryOutput::Assoc(_) => "array_assoc",
            QueryOutput::Count(_) => "rows",
            QueryOutput::LastId(_) => "id",
            QueryOutput::Done(_) => "done",
        }
    }
}

fn shape_mismatch(expected: &str, got: &QueryOutput) -> DbError {
    DbError::query(format!(
        "expected {expected} output, got {}",
        got.kind()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResultSet {
        ResultSet::new(
            vec!["id".into(), "name".into()],
            vec![
                vec![Value::Int(1), Value::from("Isis")],
                vec![Value::Int(2), Value::Null],
            ],
        )
    }

    #[test]
    fn objects_have_named_access() {
        let rows = sample().into_objects();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].try_get::<i64>("id").unwrap(), 1);
        assert_eq!(rows[0]["name"], Value::from("Isis"));
        assert_eq!(rows[1].try_get::<Option<String>>("name").unwrap(), None);
        assert!(rows[0].try_get::<i64>("missing").is_err());
        assert_eq!(rows[1].get::<i64>("missing"), None);
    }

    #[test]
    fn assoc_keeps_column_order() {
        let rows = sample().into_assoc();
        let keys: Vec<&String> = rows[0].keys().collect();
        assert_eq!(keys, ["id", "name"]);
    }

    #[test]
    fn empty_result_set_yields_empty_sequences() {
        let empty = ResultSet::new(vec!["id".into()], vec![]);
        assert!(empty.clone().into_objects().is_empty());
        assert!(empty.clone().into_numeric().is_empty());
        assert!(empty.into_assoc().is_empty());
    }

    #[test]
    fn row_serializes_as_object() {
        let rows = sample().into_objects();
        let json = serde_json::to_string(&rows[0]).unwrap();
        assert_eq!(json, r#"{"id":1,"name":"Isis"}"#);
    }

    #[test]
    fn output_accessors() {
        assert_eq!(QueryOutput::Count(3).count(), Some(3));
        assert_eq!(QueryOutput::LastId(9).last_id(), Some(9));
        assert!(QueryOutput::Done(true).is_done());
        let err = QueryOutput::Count(1).into_objects().unwrap_err();
        assert!(err.to_string().contains("expected obj output"));
    }
}
