//! # sqlbridge
//!
//! A provider-agnostic SQL access layer: a fluent statement builder on top of
//! pluggable database backends.
//!
//! ## Features
//!
//! - **Fluent builder**: `select`/`insert`/`update`/`replace`/`delete` plus
//!   `create`/`truncate`/`drop_table`, executed with one `execute` call
//! - **Raw SQL**: `query` and `query_with` for hand-written statements with
//!   named (`:name`) or positional (`?`) markers
//! - **Pluggable backends**: SQLite (bundled) and PostgreSQL built in; anything
//!   implementing [`Backend`] can be registered
//! - **Result shapes**: objects, numeric rows, associative rows, row counts or
//!   the last insert id
//! - **Connection registry**: one live engine per identifier, with an optional
//!   TOML configuration source
//! - **Query hooks**: tracing, statistics or vetoes around every statement
//!
//! ## Quick start
//!
//! ```ignore
//! use sqlbridge::prelude::*;
//!
//! let mut db = Engine::new(SqliteBackend::in_memory()?);
//!
//! db.create([("id", "INTEGER PRIMARY KEY"), ("name", "TEXT NOT NULL")])
//!     .table("users")
//!     .execute()?;
//!
//! let id = db
//!     .insert_with(
//!         data! { "name" => ":name" },
//!         bindings![(":name", "Isis")],
//!     )
//!     .in_table("users")
//!     .execute_as(ResultShape::LastId)?;
//!
//! #[derive(FromRow)]
//! struct User {
//!     id: i64,
//!     name: String,
//! }
//!
//! let users: Vec<User> = db
//!     .select("*")
//!     .from("users")
//!     .order("id DESC")
//!     .execute()?
//!     .into_typed()?;
//! ```

extern crate self as sqlbridge;

pub mod backend;
pub mod binding;
pub mod engine;
pub mod error;
pub mod monitor;
pub mod prelude;
pub mod registry;
pub mod render;
pub mod row;
pub mod settings;
pub mod statement;
pub mod value;

#[cfg(test)]
mod testing;

pub use backend::{Backend, ConnectOptions, RawResponse};
#[cfg(feature = "postgres")]
pub use backend::PostgresBackend;
#[cfg(feature = "sqlite")]
pub use backend::SqliteBackend;
pub use binding::{Binding, Marker};
pub use engine::Engine;
pub use error::{DbError, DbResult};
pub use monitor::{
    HookAction, InstrumentedBackend, QueryContext, QueryHook, QueryResult, QueryStats, StatsHook,
    TracingSqlHook,
};
pub use registry::{BackendFactory, ConnectionRegistry, SharedEngine};
pub use render::Dialect;
pub use row::{AssocRow, FromRow, QueryOutput, ResultSet, Row};
pub use settings::{
    ConfigSource, ConnectionConfig, ConnectionSettings, MapConfigSource, TomlConfigSource,
};
pub use statement::{Columns, QueryType, ResultShape, Statement, StatementConfig};
pub use value::{FromValue, TypeHint, Value};

#[cfg(feature = "derive")]
pub use sqlbridge_derive::FromRow;
