//! Error types for myorm

use thiserror::Error;

/// Result type alias for myorm operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for database operations
#[derive(Debug, Error)]
pub enum OrmError {
    /// The engine is unreachable (pool checkout, socket or handshake failure)
    #[error("Connection error: {0}")]
    Connection(String),

    /// The engine rejected a statement during prepare, bind or execute
    #[error("Statement error: {0}")]
    Statement(String),

    /// An introspection target does not exist (e.g. `DESCRIBE` of an unknown table)
    #[error("Query error: {0}")]
    Query(String),

    /// A programming error upstream, never retryable
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A builder was asked for a statement that has no valid SQL form
    #[error("Validation error: {0}")]
    Validation(String),

    /// The statement did not finish within the configured timeout
    #[error("Query timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl OrmError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Check if this is a configuration error.
    ///
    /// Repository callers degrade engine failures to "no result", but must
    /// let these through.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Check if this is a connection error
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Check if this error came from the engine (connection, statement or introspection)
    pub fn is_engine_failure(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::Statement(_) | Self::Query(_) | Self::Timeout(_)
        )
    }
}

#[cfg(feature = "mysql")]
impl From<mysql_async::Error> for OrmError {
    fn from(err: mysql_async::Error) -> Self {
        match err {
            // ER_NO_SUCH_TABLE
            mysql_async::Error::Server(ref server) if server.code == 1146 => {
                Self::Query(server.message.clone())
            }
            mysql_async::Error::Server(server) => {
                Self::Statement(format!("{} ({})", server.message, server.code))
            }
            mysql_async::Error::Io(e) => Self::Connection(e.to_string()),
            mysql_async::Error::Driver(e) => Self::Connection(e.to_string()),
            mysql_async::Error::Url(e) => Self::Connection(e.to_string()),
            other => Self::Other(other.to_string()),
        }
    }
}
