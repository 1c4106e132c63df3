//! Error types for notepath-core.

use rusqlite::ErrorCode;
use thiserror::Error;

/// Result type alias using notepath-core Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for notepath operations
#[derive(Error, Debug)]
pub enum Error {
    // Database errors
    #[error("Database error: {0}")]
    Database(rusqlite::Error),

    #[error("Database is locked (apparently another program is using it)")]
    DatabaseLocked,

    #[error("Database lock poisoned")]
    LockPoisoned,

    #[error("Integrity violation: {0}")]
    IntegrityViolation(String),

    // Directive errors
    #[error("Cannot add note; path is in use: {0}")]
    DuplicatePath(String),

    #[error("Cannot merge notes: {0}")]
    IncompatibleMerge(String),

    // Saved query errors
    #[error("Saved query not found: {0}")]
    SavedQueryNotFound(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a merge error
    pub fn incompatible_merge(message: impl Into<String>) -> Self {
        Self::IncompatibleMerge(message.into())
    }

    /// True for errors that must abort the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::DatabaseLocked | Self::Database(_) | Self::LockPoisoned)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        match e.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => Self::DatabaseLocked,
            Some(ErrorCode::ConstraintViolation) => Self::IntegrityViolation(e.to_string()),
            _ => Self::Database(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::DuplicatePath("some/path".to_string());
        assert!(err.to_string().contains("some/path"));
        assert!(!err.is_fatal());

        let err = Error::incompatible_merge("different notepaths");
        assert!(err.to_string().contains("different notepaths"));

        assert!(Error::DatabaseLocked.is_fatal());
    }

    #[test]
    fn test_constraint_violation_is_integrity_error() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (path TEXT UNIQUE); INSERT INTO t VALUES ('a');")
            .unwrap();
        let err: Error = conn
            .execute("INSERT INTO t VALUES ('a')", [])
            .unwrap_err()
            .into();
        assert!(matches!(err, Error::IntegrityViolation(_)));
    }
}
