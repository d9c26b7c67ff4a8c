//! Error types for sqlbridge

use thiserror::Error;

/// Result type alias for sqlbridge operations
pub type DbResult<T> = Result<T, DbError>;

/// Error types for connection acquisition and statement execution.
///
/// Messages coming from a database driver are carried verbatim, so callers can
/// match on driver-specific substrings (e.g. `"UNIQUE constraint failed"` or
/// `"duplicate key"`).
#[derive(Debug, Error)]
pub enum DbError {
    /// The requested backend kind has no registered implementation
    #[error("The provider doesn't exist: {0}")]
    UnknownProvider(String),

    /// Connecting to the backend failed
    #[error("Could not connect to provider: {0}")]
    Connection(String),

    /// The statement kind is missing or not a recognized keyword
    #[error("Unknown query type: {0}")]
    UnknownQueryType(String),

    /// The backend reported a failure while executing a statement
    #[error("Error executing the query: {0}")]
    QueryExecution(String),

    /// Configuration lookup or parsing failed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Typed row access failed
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// A query hook refused to let the statement run
    #[error("Query aborted by hook: {0}")]
    HookAborted(String),
}

impl DbError {
    /// Create a query execution error from a driver message
    pub fn query(message: impl Into<String>) -> Self {
        Self::QueryExecution(message.into())
    }

    /// Create a connection error from a driver message
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Check if this is an unknown provider error
    pub fn is_unknown_provider(&self) -> bool {
        matches!(self, Self::UnknownProvider(_))
    }

    /// Check if this is a connection error
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Check if this is an unknown query type error
    pub fn is_unknown_query_type(&self) -> bool {
        matches!(self, Self::UnknownQueryType(_))
    }

    /// Check if this is a query execution error
    pub fn is_query_execution(&self) -> bool {
        matches!(self, Self::QueryExecution(_))
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        Self::QueryExecution(err.to_string())
    }
}
