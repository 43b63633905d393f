use std::time::Duration;

use thiserror::Error;

/// Failures raised by the MySQL adapter.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("failed to connect to {address}")]
    Connect {
        address: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("timed out after {timeout:?} connecting to {address}")]
    ConnectTimeout { address: String, timeout: Duration },

    #[error("statement failed: {statement}")]
    Statement {
        statement: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("connectivity probe returned {0}, expected 1")]
    UnexpectedProbe(i64),

    #[error("failed to close connection")]
    Close(#[source] sqlx::Error),
}

impl DbError {
    /// True for failures that happened before a session existed.
    pub fn is_connect(&self) -> bool {
        matches!(self, DbError::Connect { .. } | DbError::ConnectTimeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_errors_are_classified() {
        let timeout = DbError::ConnectTimeout {
            address: "db:3306".to_string(),
            timeout: Duration::from_secs(1),
        };
        assert!(timeout.is_connect());
        assert!(!DbError::UnexpectedProbe(0).is_connect());
    }

    #[test]
    fn statement_error_names_the_statement() {
        let error = DbError::Statement {
            statement: "SELECT 1".to_string(),
            source: sqlx::Error::PoolClosed,
        };
        assert_eq!(error.to_string(), "statement failed: SELECT 1");
    }
}
