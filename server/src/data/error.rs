//! Unified error type for the data layer

use thiserror::Error;

/// Error type for data layer operations
#[derive(Error, Debug)]
pub enum DataError {
    /// SQLite database error
    #[error("SQLite error: {0}")]
    Sqlite(sqlx::Error),

    /// Migration failed
    #[error("Migration {version} ({name}) failed: {error}")]
    MigrationFailed {
        version: i32,
        name: String,
        error: String,
    },

    /// Stored JSON column could not be decoded
    #[error("Corrupt {column} column: {error}")]
    Serialization {
        column: &'static str,
        error: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Conflict error (e.g., duplicate name)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Input rejected by a storage invariant
    #[error("Invalid input: {0}")]
    Invalid(String),
}

impl DataError {
    /// Check if this is a connection-related error that might be transient
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Sqlite(e) => matches!(
                e,
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
            ),
            _ => false,
        }
    }
}

/// Convert from the SQLite backend error type
impl From<crate::data::sqlite::SqliteError> for DataError {
    fn from(e: crate::data::sqlite::SqliteError) -> Self {
        use crate::data::sqlite::SqliteError;
        match e {
            SqliteError::Database(e) => Self::Sqlite(e),
            SqliteError::MigrationFailed {
                version,
                name,
                error,
            } => Self::MigrationFailed {
                version,
                name,
                error,
            },
            SqliteError::Serialization { column, error } => Self::Serialization { column, error },
            SqliteError::Io(e) => Self::Io(e),
            SqliteError::Conflict(msg) => Self::Conflict(msg),
            SqliteError::Invalid(msg) => Self::Invalid(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sqlite::SqliteError;

    #[test]
    fn test_migration_failed_display() {
        let err = DataError::MigrationFailed {
            version: 2,
            name: "add_records_index".to_string(),
            error: "syntax error".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Migration 2 (add_records_index) failed: syntax error"
        );
    }

    #[test]
    fn test_from_sqlite_conflict() {
        let err: DataError = SqliteError::Conflict("Dashboard name taken".into()).into();
        assert!(matches!(err, DataError::Conflict(ref m) if m == "Dashboard name taken"));
    }

    #[test]
    fn test_from_sqlite_invalid() {
        let err: DataError = SqliteError::Invalid("no charts".into()).into();
        assert!(matches!(err, DataError::Invalid(ref m) if m == "no charts"));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_is_transient() {
        assert!(DataError::Sqlite(sqlx::Error::PoolTimedOut).is_transient());
        assert!(!DataError::Config("bad".into()).is_transient());
        assert!(!DataError::Conflict("taken".into()).is_transient());
    }
}
