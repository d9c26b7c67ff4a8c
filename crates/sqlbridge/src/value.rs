//! Backend-neutral SQL values.
//!
//! [`Value`] is what flows between the engine and every backend: data values
//! given to `insert`/`update`, bound parameters, and the cells of a result set.

use crate::error::DbError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// A SQL value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Binary blob value.
    Blob(Vec<u8>),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the text content, if this is a [`Value::Text`].
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Render the value as a SQL literal for inline embedding.
    ///
    /// Text is single-quoted with embedded quotes doubled.
    pub fn to_sql_literal(&self) -> String {
        match self {
            Self::Text(s) => format!("'{}'", s.replace('\'', "''")),
            other => other.to_raw_sql(),
        }
    }

    /// Render the value without quoting text.
    ///
    /// Used when the statement carries bindings: a text value is then a marker
    /// (`:name` or `?`) and must reach the SQL untouched.
    pub fn to_raw_sql(&self) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            Self::Bool(true) => "TRUE".to_string(),
            Self::Bool(false) => "FALSE".to_string(),
            Self::Int(n) => n.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Text(s) => s.clone(),
            Self::Blob(b) => {
                let hex: String = b.iter().map(|byte| format!("{byte:02X}")).collect();
                format!("X'{hex}'")
            }
        }
    }

    /// Convert the value to the storage type named by `hint`.
    ///
    /// A NULL value stays NULL unless the hint asks for something else to be
    /// bound as NULL; only the `null` hint turns a non-NULL value into NULL.
    pub fn coerce(self, hint: TypeHint) -> Value {
        match (hint, self) {
            (TypeHint::Null, _) => Value::Null,
            (_, Value::Null) => Value::Null,

            (TypeHint::Int, Value::Int(n)) => Value::Int(n),
            (TypeHint::Int, Value::Bool(b)) => Value::Int(i64::from(b)),
            (TypeHint::Int, Value::Float(f)) => Value::Int(f.trunc() as i64),
            (TypeHint::Int, Value::Text(s)) => Value::Int(parse_leading_int(&s)),
            (TypeHint::Int, Value::Blob(_)) => Value::Int(0),

            (TypeHint::Bool, Value::Bool(b)) => Value::Bool(b),
            (TypeHint::Bool, Value::Int(n)) => Value::Bool(n != 0),
            (TypeHint::Bool, Value::Float(f)) => Value::Bool(f != 0.0),
            (TypeHint::Bool, Value::Text(s)) => Value::Bool(!(s.is_empty() || s == "0")),
            (TypeHint::Bool, Value::Blob(b)) => Value::Bool(!b.is_empty()),

            (TypeHint::Str, Value::Text(s)) => Value::Text(s),
            (TypeHint::Str, Value::Bool(b)) => Value::Text(if b { "1" } else { "" }.to_string()),
            (TypeHint::Str, Value::Int(n)) => Value::Text(n.to_string()),
            (TypeHint::Str, Value::Float(f)) => Value::Text(f.to_string()),
            (TypeHint::Str, Value::Blob(b)) => {
                Value::Text(String::from_utf8_lossy(&b).into_owned())
            }
        }
    }
}

/// Parse the leading integer of a string the way a lenient cast would
/// (`" 42abc"` -> 42, `"3.9"` -> 3, `"abc"` -> 0).
fn parse_leading_int(s: &str) -> i64 {
    let trimmed = s.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return n;
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        return f.trunc() as i64;
    }
    let end = trimmed
        .char_indices()
        .take_while(|(i, c)| c.is_ascii_digit() || (*i == 0 && (*c == '-' || *c == '+')))
        .map(|(i, c)| i + c.len_utf8())
        .last()
        .unwrap_or(0);
    trimmed[..end].parse().unwrap_or(0)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            other => f.write_str(&other.to_raw_sql()),
        }
    }
}

/// Storage type requested for a bound parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeHint {
    Bool,
    Null,
    Int,
    Str,
}

impl TypeHint {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeHint::Bool => "bool",
            TypeHint::Null => "null",
            TypeHint::Int => "int",
            TypeHint::Str => "str",
        }
    }
}

impl FromStr for TypeHint {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bool" => Ok(TypeHint::Bool),
            "null" => Ok(TypeHint::Null),
            "int" => Ok(TypeHint::Int),
            "str" => Ok(TypeHint::Str),
            other => Err(DbError::query(format!("unknown binding type hint: {other}"))),
        }
    }
}

impl fmt::Display for TypeHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Blob(v.to_vec())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

/// Typed extraction from a [`Value`].
///
/// The error is a human-readable message; callers attach the column name.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, String>;
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "NULL",
        Value::Bool(_) => "bool",
        Value::Int(_) => "integer",
        Value::Float(_) => "float",
        Value::Text(_) => "text",
        Value::Blob(_) => "blob",
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, String> {
        Ok(value.clone())
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Int(n) => Ok(*n),
            Value::Bool(b) => Ok(i64::from(*b)),
            Value::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| format!("cannot parse {s:?} as integer")),
            other => Err(format!("expected integer, got {}", type_name(other))),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Result<Self, String> {
        let n = i64::from_value(value)?;
        i32::try_from(n).map_err(|_| format!("integer {n} out of range for i32"))
    }
}

impl FromValue for u64 {
    fn from_value(value: &Value) -> Result<Self, String> {
        let n = i64::from_value(value)?;
        u64::try_from(n).map_err(|_| format!("integer {n} out of range for u64"))
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Float(f) => Ok(*f),
            Value::Int(n) => Ok(*n as f64),
            Value::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| format!("cannot parse {s:?} as float")),
            other => Err(format!("expected float, got {}", type_name(other))),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::Int(n) => Ok(*n != 0),
            other => Err(format!("expected bool, got {}", type_name(other))),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Text(s) => Ok(s.clone()),
            Value::Int(_) | Value::Float(_) | Value::Bool(_) => Ok(value.to_raw_sql()),
            other => Err(format!("expected text, got {}", type_name(other))),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Blob(b) => Ok(b.clone()),
            Value::Text(s) => Ok(s.as_bytes().to_vec()),
            other => Err(format!("expected blob, got {}", type_name(other))),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// Build an ordered column → value list for `insert`/`update`/`replace`.
///
/// ```ignore
/// let data = sqlbridge::data! {
///     "name" => "Isis",
///     "email" => "isis@example.com",
///     "age" => 30,
/// };
/// ```
#[macro_export]
macro_rules! data {
    () => {
        ::std::vec::Vec::<(::std::string::String, $crate::Value)>::new()
    };
    ($($column:expr => $value:expr),+ $(,)?) => {
        ::std::vec![$((::std::string::String::from($column), $crate::Value::from($value))),+]
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_quotes_and_escapes_text() {
        assert_eq!(Value::from("hello").to_sql_literal(), "'hello'");
        assert_eq!(Value::from("it's").to_sql_literal(), "'it''s'");
        assert_eq!(Value::Int(-7).to_sql_literal(), "-7");
        assert_eq!(Value::Null.to_sql_literal(), "NULL");
    }

    #[test]
    fn raw_sql_leaves_markers_alone() {
        assert_eq!(Value::from(":name").to_raw_sql(), ":name");
        assert_eq!(Value::from("?").to_raw_sql(), "?");
        assert_eq!(Value::Blob(vec![0xde, 0xad]).to_raw_sql(), "X'DEAD'");
    }

    #[test]
    fn coerce_null_hint_always_nulls() {
        assert_eq!(Value::Int(0).coerce(TypeHint::Null), Value::Null);
        assert_eq!(Value::from("").coerce(TypeHint::Null), Value::Null);
    }

    #[test]
    fn coerce_keeps_null_for_other_hints() {
        assert_eq!(Value::Null.coerce(TypeHint::Int), Value::Null);
        assert_eq!(Value::Null.coerce(TypeHint::Str), Value::Null);
    }

    #[test]
    fn coerce_int_parses_text() {
        assert_eq!(Value::from("42").coerce(TypeHint::Int), Value::Int(42));
        assert_eq!(Value::from("3.9").coerce(TypeHint::Int), Value::Int(3));
        assert_eq!(Value::from("12abc").coerce(TypeHint::Int), Value::Int(12));
        assert_eq!(Value::from("abc").coerce(TypeHint::Int), Value::Int(0));
    }

    #[test]
    fn coerce_bool_uses_truthiness() {
        assert_eq!(Value::from("0").coerce(TypeHint::Bool), Value::Bool(false));
        assert_eq!(Value::from("").coerce(TypeHint::Bool), Value::Bool(false));
        assert_eq!(Value::from("yes").coerce(TypeHint::Bool), Value::Bool(true));
        assert_eq!(Value::Int(2).coerce(TypeHint::Bool), Value::Bool(true));
    }

    #[test]
    fn coerce_str_stringifies() {
        assert_eq!(Value::Int(5).coerce(TypeHint::Str), Value::from("5"));
        assert_eq!(Value::Bool(false).coerce(TypeHint::Str), Value::from(""));
    }

    #[test]
    fn type_hint_parses_known_names() {
        assert_eq!("int".parse::<TypeHint>().unwrap(), TypeHint::Int);
        assert_eq!("null".parse::<TypeHint>().unwrap(), TypeHint::Null);
        assert!("float".parse::<TypeHint>().is_err());
    }

    #[test]
    fn from_value_option_and_numbers() {
        assert_eq!(Option::<i64>::from_value(&Value::Null).unwrap(), None);
        assert_eq!(i64::from_value(&Value::from("17")).unwrap(), 17);
        assert_eq!(f64::from_value(&Value::Int(2)).unwrap(), 2.0);
        assert!(i32::from_value(&Value::Int(i64::MAX)).is_err());
        assert!(bool::from_value(&Value::from("x")).is_err());
    }

    #[test]
    fn data_macro_keeps_insertion_order() {
        let data = crate::data! { "name" => "Isis", "age" => 30, "nick" => Option::<&str>::None };
        let columns: Vec<&str> = data.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(columns, ["name", "age", "nick"]);
        assert_eq!(data[1].1, Value::Int(30));
        assert_eq!(data[2].1, Value::Null);
    }

    #[test]
    fn serializes_untagged() {
        let json = serde_json::to_string(&vec![Value::Null, Value::Int(1), Value::from("a")]).unwrap();
        assert_eq!(json, r#"[null,1,"a"]"#);
    }
}
