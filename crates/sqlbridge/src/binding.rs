//! Parameter bindings: `(marker, value, optional type hint)` triples.

use crate::value::{TypeHint, Value};
use std::fmt;

/// A placeholder in SQL text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Marker {
    /// Named marker, stored with its leading colon (`:name`).
    Named(String),
    /// Positional marker (`?`), 1-based.
    Positional(usize),
}

impl Marker {
    /// Create a named marker; a missing leading `:` is added.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        if name.starts_with(':') {
            Marker::Named(name)
        } else {
            Marker::Named(format!(":{name}"))
        }
    }

    /// The marker name without its colon, for named markers.
    pub fn name(&self) -> Option<&str> {
        match self {
            Marker::Named(n) => Some(n.trim_start_matches(':')),
            Marker::Positional(_) => None,
        }
    }

    /// Whether `placeholder` (as written in SQL or in a data value) refers to
    /// this marker. `?` matches positional marker `position`.
    pub fn matches(&self, placeholder: &str, position: usize) -> bool {
        match self {
            Marker::Named(n) => placeholder == n,
            Marker::Positional(p) => placeholder == "?" && *p == position,
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Marker::Named(n) => f.write_str(n),
            Marker::Positional(p) => write!(f, "?{p}"),
        }
    }
}

impl From<&str> for Marker {
    fn from(s: &str) -> Self {
        match s.parse::<usize>() {
            Ok(p) => Marker::Positional(p),
            Err(_) => Marker::named(s),
        }
    }
}

impl From<String> for Marker {
    fn from(s: String) -> Self {
        Marker::from(s.as_str())
    }
}

impl From<usize> for Marker {
    fn from(p: usize) -> Self {
        Marker::Positional(p)
    }
}

impl From<i32> for Marker {
    fn from(p: i32) -> Self {
        Marker::Positional(usize::try_from(p).unwrap_or(0))
    }
}

/// A single parameter binding.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub marker: Marker,
    pub value: Value,
    pub hint: Option<TypeHint>,
}

impl Binding {
    pub fn new(marker: impl Into<Marker>, value: impl Into<Value>) -> Self {
        Self {
            marker: marker.into(),
            value: value.into(),
            hint: None,
        }
    }

    /// Bind `value` to the named marker `:name`.
    pub fn named(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(Marker::named(name), value)
    }

    /// Bind `value` to the `position`-th `?` (1-based).
    pub fn positional(position: usize, value: impl Into<Value>) -> Self {
        Self::new(Marker::Positional(position), value)
    }

    /// Request that the value be stored as `hint`.
    pub fn with_hint(mut self, hint: TypeHint) -> Self {
        self.hint = Some(hint);
        self
    }

    /// The value as it should be handed to the driver, with the type hint applied.
    pub fn bound_value(&self) -> Value {
        match self.hint {
            Some(hint) => self.value.clone().coerce(hint),
            None => self.value.clone(),
        }
    }
}

impl<M, V> From<(M, V)> for Binding
where
    M: Into<Marker>,
    V: Into<Value>,
{
    fn from((marker, value): (M, V)) -> Self {
        Binding::new(marker, value)
    }
}

impl<M, V> From<(M, V, TypeHint)> for Binding
where
    M: Into<Marker>,
    V: Into<Value>,
{
    fn from((marker, value, hint): (M, V, TypeHint)) -> Self {
        Binding::new(marker, value).with_hint(hint)
    }
}

/// Find the binding that a data value refers to, if the value is a marker.
///
/// `position` is the 1-based index the value would occupy among `?` markers.
pub(crate) fn binding_for<'a>(
    bindings: &'a [Binding],
    placeholder: &str,
    position: usize,
) -> Option<&'a Binding> {
    bindings
        .iter()
        .find(|b| b.marker.matches(placeholder, position))
}

/// Build a `Vec<Binding>` from tuples.
///
/// ```ignore
/// let b = sqlbridge::bindings![
///     (":name", "Manny"),
///     (":email", "manny@example.com", TypeHint::Str),
/// ];
/// ```
#[macro_export]
macro_rules! bindings {
    () => {
        ::std::vec::Vec::<$crate::Binding>::new()
    };
    ($($binding:expr),+ $(,)?) => {
        ::std::vec![$($crate::Binding::from($binding)),+]
    };
}
