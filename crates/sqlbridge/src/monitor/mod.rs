//! Query hooks around statement execution.
//!
//! Hooks see every SQL statement a backend runs, can veto it, and get its
//! outcome and duration afterwards.
//!
//! # Example
//!
//! ```rust,ignore
//! use sqlbridge::monitor::{StatsHook, TracingSqlHook};
//! use std::sync::Arc;
//!
//! let stats = Arc::new(StatsHook::new());
//! let mut db = Engine::new(SqliteBackend::in_memory()?)
//!     .with_hook(TracingSqlHook::new())
//!     .with_hook_arc(stats.clone());
//!
//! db.select("*").from("users").execute()?;
//! assert_eq!(stats.stats().select_count, 1);
//! ```

mod instrumented;
mod stats;
mod tracing_hook;
mod types;


pub use instrumented::InstrumentedBackend;
pub use stats::{QueryStats, StatsHook};
pub use tracing_hook::TracingSqlHook;
pub use types::{HookAction, QueryContext, QueryHook, QueryResult};

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
