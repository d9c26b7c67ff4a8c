//! Convenient imports for typical `sqlbridge` usage.
//!
//! ```ignore
//! use sqlbridge::prelude::*;
//! ```

pub use crate::{
    Backend, Binding, ConnectionConfig, ConnectionRegistry, DbError, DbResult, Engine, FromRow,
    QueryOutput, ResultShape, Row, SharedEngine, TypeHint, Value,
};
pub use crate::{bindings, data};

#[cfg(feature = "postgres")]
pub use crate::PostgresBackend;
#[cfg(feature = "sqlite")]
pub use crate::SqliteBackend;
