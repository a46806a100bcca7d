// ABOUTME: Error taxonomy for extension reconciliation
// ABOUTME: Separates connection, identifier, query, and parameter failures

use thiserror::Error;

/// Every way an invocation can fail.
///
/// All variants are fatal: nothing is retried and no rollback is attempted.
/// A failed DDL statement simply does not apply.
#[derive(Debug, Error)]
pub enum ExtensionError {
    /// The session could not be established. Nothing was read or written.
    #[error("unable to connect to database: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<tokio_postgres::Error>,
    },

    /// The extension name failed the strict identifier pattern.
    #[error("{0:?} is not a valid identifier")]
    InvalidIdentifier(String),

    /// A catalog query or DDL statement was rejected by the server.
    #[error("Database query failed: {message}")]
    Query {
        message: String,
        #[source]
        source: Option<tokio_postgres::Error>,
    },

    /// Reserved for logic errors that are not raw database failures.
    #[error("{0}")]
    NotSupported(String),

    /// A required option is missing or malformed.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

impl ExtensionError {
    pub(crate) fn query(context: &str, source: tokio_postgres::Error) -> Self {
        // Server errors carry the useful text (SQLSTATE message) in the DbError
        let detail = match source.as_db_error() {
            Some(db) => db.message().to_string(),
            None => source.to_string(),
        };
        ExtensionError::Query {
            message: format!("{}: {}", context, detail),
            source: Some(source),
        }
    }

    pub(crate) fn connection(message: impl Into<String>) -> Self {
        ExtensionError::Connection {
            message: message.into(),
            source: None,
        }
    }

    pub(crate) fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        ExtensionError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
