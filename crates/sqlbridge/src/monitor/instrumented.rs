use super::types::{HookAction, QueryContext, QueryHook, QueryResult};
use crate::backend::{Backend, ConnectOptions, RawResponse};
use crate::binding::Binding;
use crate::error::{DbError, DbResult};
use crate::render::Dialect;
use crate::row::QueryOutput;
use crate::statement::{QueryType, ResultShape};
use std::sync::Arc;
use std::time::Instant;

/// A backend wrapper that runs query hooks around every execution.
///
/// Only the execution primitives are intercepted; the per-statement methods
/// are the trait's provided ones, so rendered statements (and REPLACE's probe)
/// pass through the hooks too.
pub struct InstrumentedBackend {
    inner: Box<dyn Backend>,
    hooks: Vec<Arc<dyn QueryHook>>,
    identifier: Option<String>,
}

impl InstrumentedBackend {
    pub fn new(inner: Box<dyn Backend>) -> Self {
        Self {
            inner,
            hooks: Vec::new(),
            identifier: None,
        }
    }

    /// Add a query hook.
    pub fn with_hook<H: QueryHook + 'static>(self, hook: H) -> Self {
        self.with_hook_arc(Arc::new(hook))
    }

    /// Add a query hook from an `Arc`.
    pub fn with_hook_arc(mut self, hook: Arc<dyn QueryHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn add_hook_arc(&mut self, hook: Arc<dyn QueryHook>) {
        self.hooks.push(hook);
    }

    /// Tag every hook context with a registry identifier.
    pub fn set_identifier(&mut self, identifier: impl Into<String>) {
        self.identifier = Some(identifier.into());
    }

    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    pub fn inner(&self) -> &dyn Backend {
        self.inner.as_ref()
    }

    pub fn inner_mut(&mut self) -> &mut dyn Backend {
        self.inner.as_mut()
    }

    fn observe<F>(&mut self, ctx: QueryContext, exec: F) -> DbResult<RawResponse>
    where
        F: FnOnce(&mut dyn Backend) -> DbResult<RawResponse>,
    {
        let ctx = ctx.with_identifier(self.identifier.clone());
        for hook in &self.hooks {
            if let HookAction::Abort(reason) = hook.before_query(&ctx) {
                return Err(DbError::HookAborted(reason));
            }
        }

        if self.hooks.is_empty() {
            return exec(self.inner.as_mut());
        }

        let start = Instant::now();
        let result = exec(self.inner.as_mut());
        let elapsed = start.elapsed();

        let outcome = match &result {
            Ok(RawResponse::ResultSet(rs)) => QueryResult::Rows(rs.len()),
            Ok(RawResponse::Affected(n)) => QueryResult::Affected(*n),
            Ok(RawResponse::Done) => QueryResult::Done,
            Err(err) => QueryResult::error(err.to_string()),
        };
        for hook in &self.hooks {
            hook.after_query(&ctx, elapsed, &outcome);
        }
        result
    }
}

impl std::fmt::Debug for InstrumentedBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstrumentedBackend")
            .field("kind", &self.inner.kind())
            .field("hooks", &self.hooks.len())
            .field("identifier", &self.identifier)
            .finish()
    }
}

impl Backend for InstrumentedBackend {
    fn kind(&self) -> &'static str {
        self.inner.kind()
    }

    fn dialect(&self) -> Dialect {
        self.inner.dialect()
    }

    fn connect(&mut self, options: &ConnectOptions) -> DbResult<()> {
        self.inner.connect(options)
    }

    fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    fn raw_execute(&mut self, sql: &str, hint: QueryType) -> DbResult<RawResponse> {
        let ctx = QueryContext::new(sql, 0).with_query_type(hint);
        self.observe(ctx, |backend| backend.raw_execute(sql, hint))
    }

    fn bound_execute(&mut self, sql: &str, bindings: &[Binding]) -> DbResult<RawResponse> {
        let ctx = QueryContext::new(sql, bindings.len());
        self.observe(ctx, |backend| backend.bound_execute(sql, bindings))
    }

    fn last_insert_id(&self) -> i64 {
        self.inner.last_insert_id()
    }

    fn error_text(&self) -> &str {
        self.inner.error_text()
    }

    fn release(&mut self) {
        self.inner.release();
    }

    fn row_count(&self, response: &RawResponse) -> u64 {
        self.inner.row_count(response)
    }

    fn fetch(&self, response: RawResponse, shape: ResultShape) -> DbResult<QueryOutput> {
        self.inner.fetch(response, shape)
    }
}
