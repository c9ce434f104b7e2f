//! Error types for the bootstrap layer
//!
//! This module defines all error types that can occur while configuring the
//! database, running migrations, or talking to a backend.

/// Result type alias for database operations
pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Error types for database configuration and operations
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// A constructor or builder argument failed validation
    #[error("Invalid argument '{param}': {message}")]
    InvalidArgument {
        param: &'static str,
        message: String,
    },

    /// Invalid connection string
    #[error("Invalid connection string: {0}")]
    InvalidConnectionString(String),

    /// Configuration could not be loaded or is incomplete
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Connection error (generic)
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Connection timeout
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout { timeout_ms: u64 },

    /// Query execution error
    #[error("Query execution error: {0}")]
    QueryError(String),

    /// Query timeout
    #[error("Query timeout after {timeout_ms}ms")]
    QueryTimeout { timeout_ms: u64 },

    /// Column not found
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// Transaction error
    #[error("Transaction error: {0}")]
    TransactionError(String),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(String),

    /// ID generator error
    #[error("ID generator error: {0}")]
    IdGenerator(String),

    /// No service of the requested type was registered
    #[error("Service not registered: {0}")]
    ServiceNotRegistered(&'static str),

    /// A blocking entrypoint was called from inside an async runtime
    #[error("'{0}' blocks the current thread and cannot run inside an async runtime; use the async variant")]
    BlockingInAsyncContext(&'static str),

    /// Unsupported operation
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON configuration error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// SQLite error
    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl DatabaseError {
    /// Create an argument validation error naming the offending parameter
    pub fn invalid_argument(param: &'static str, message: impl Into<String>) -> Self {
        DatabaseError::InvalidArgument {
            param,
            message: message.into(),
        }
    }

    /// Create an invalid connection string error
    pub fn invalid_connection_string<S: Into<String>>(msg: S) -> Self {
        DatabaseError::InvalidConnectionString(msg.into())
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        DatabaseError::Configuration(msg.into())
    }

    /// Create a new connection error (generic)
    pub fn connection<S: Into<String>>(msg: S) -> Self {
        DatabaseError::ConnectionError(msg.into())
    }

    /// Create a connection timeout error
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        DatabaseError::ConnectionTimeout { timeout_ms }
    }

    /// Create a new query error
    pub fn query<S: Into<String>>(msg: S) -> Self {
        DatabaseError::QueryError(msg.into())
    }

    /// Create a query timeout error
    pub fn query_timeout(timeout_ms: u64) -> Self {
        DatabaseError::QueryTimeout { timeout_ms }
    }

    /// Create a new transaction error
    pub fn transaction<S: Into<String>>(msg: S) -> Self {
        DatabaseError::TransactionError(msg.into())
    }

    /// Create a new migration error
    pub fn migration<S: Into<String>>(msg: S) -> Self {
        DatabaseError::Migration(msg.into())
    }

    /// Create a new ID generator error
    pub fn id_generator<S: Into<String>>(msg: S) -> Self {
        DatabaseError::IdGenerator(msg.into())
    }

    /// Create a new unsupported operation error
    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        DatabaseError::UnsupportedOperation(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        DatabaseError::Other(msg.into())
    }

    /// Name of the offending parameter for argument validation errors
    pub fn param_name(&self) -> Option<&'static str> {
        match self {
            DatabaseError::InvalidArgument { param, .. } => Some(*param),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = DatabaseError::connection("Failed to connect");
        assert!(matches!(err, DatabaseError::ConnectionError(_)));

        let err = DatabaseError::query("Invalid SQL");
        assert!(matches!(err, DatabaseError::QueryError(_)));

        let err = DatabaseError::invalid_argument("connection_string", "empty");
        assert!(matches!(err, DatabaseError::InvalidArgument { .. }));
        assert_eq!(err.param_name(), Some("connection_string"));
    }

    #[test]
    fn test_error_display() {
        let err = DatabaseError::connection("Connection refused");
        assert_eq!(err.to_string(), "Connection error: Connection refused");

        let err = DatabaseError::invalid_argument("connection_string", "must not be empty");
        assert_eq!(
            err.to_string(),
            "Invalid argument 'connection_string': must not be empty"
        );

        let err = DatabaseError::ServiceNotRegistered("u32");
        assert_eq!(err.to_string(), "Service not registered: u32");
    }
}
