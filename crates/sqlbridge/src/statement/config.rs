use super::{
    Clauses, Columns, CreateParams, Data, DeleteParams, InsertParams, QueryType, ReplaceParams,
    ResultShape, SelectParams, Statement, UpdateParams,
};
use crate::binding::Binding;
use crate::error::{DbError, DbResult};

/// Mutable statement state accumulated by one engine between executions.
///
/// Every field is cleared by [`StatementConfig::reset`]; the engine resets after
/// each `execute`/`query`, successful or not.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementConfig {
    pub query_type: Option<QueryType>,
    pub table: Option<String>,
    pub columns: Columns,
    pub data: Data,
    /// CREATE column definitions (name → type/constraint fragment).
    pub column_defs: Vec<(String, String)>,
    pub where_clauses: Vec<String>,
    pub order: Vec<String>,
    pub limit: Option<u64>,
    pub bindings: Option<Vec<Binding>>,
    pub foreign_keys: Vec<String>,
    pub references: Vec<String>,
    pub on_tables: Vec<String>,
    pub actions: Vec<String>,
    pub engine: Option<String>,
    pub charset: Option<String>,
    pub result_shape: ResultShape,
}

impl StatementConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear everything, including the query type and result shape.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether nothing has been configured since the last reset.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Replace the active binding set; `None` clears it.
    pub fn set_bindings(&mut self, bindings: Option<Vec<Binding>>) {
        self.bindings = bindings;
    }

    /// Append `bindings` after any bindings already held, keeping call order.
    ///
    /// With no active set, `bindings` becomes the active set outright.
    pub fn merge_bindings(&mut self, bindings: Option<Vec<Binding>>) {
        let Some(new) = bindings else {
            return;
        };
        match self.bindings.as_mut() {
            Some(existing) => existing.extend(new),
            None => self.bindings = Some(new),
        }
    }

    /// Build the statement for the active query type.
    ///
    /// Only the fields the statement kind uses are forwarded.
    pub fn to_statement(&self) -> DbResult<Statement> {
        let query_type = self
            .query_type
            .ok_or_else(|| DbError::UnknownQueryType("no query type set".to_string()))?;
        let table = self.table.clone().ok_or_else(|| {
            DbError::query(format!("no table specified for {query_type} statement"))
        })?;

        let statement = match query_type {
            QueryType::Select => Statement::Select(SelectParams {
                columns: self.columns.clone(),
                table,
                where_clauses: Clauses(self.where_clauses.clone()),
                order: Clauses(self.order.clone()),
                limit: self.limit,
                bindings: self.bindings.clone(),
            }),
            QueryType::Insert => Statement::Insert(InsertParams {
                table,
                data: self.data.clone(),
                bindings: self.bindings.clone(),
            }),
            QueryType::Update => Statement::Update(UpdateParams {
                table,
                data: self.data.clone(),
                bindings: self.bindings.clone(),
                where_clauses: Clauses(self.where_clauses.clone()),
            }),
            QueryType::Replace => Statement::Replace(ReplaceParams {
                table,
                data: self.data.clone(),
                bindings: self.bindings.clone(),
            }),
            QueryType::Delete => Statement::Delete(DeleteParams {
                table,
                bindings: self.bindings.clone(),
                where_clauses: Clauses(self.where_clauses.clone()),
            }),
            QueryType::Create => Statement::Create(CreateParams {
                table,
                columns: self.column_defs.clone(),
                foreign_keys: self.foreign_keys.clone(),
                references: self.references.clone(),
                on_tables: self.on_tables.clone(),
                actions: self.actions.clone(),
                engine: self.engine.clone(),
                charset: self.charset.clone(),
            }),
            QueryType::Truncate => Statement::Truncate { table },
            QueryType::Drop => Statement::Drop { table },
        };
        Ok(statement)
    }
}
