//! Data-access error types

use async_sqlite::rusqlite;
use async_sqlite::rusqlite::ErrorCode;

/// Errors raised by the SQLite data layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// SQLite or connection-pool failure.
    #[error("Database error: {0}")]
    Database(#[from] async_sqlite::Error),
}

impl StoreError {
    /// Returns `true` for errors that may succeed on retry (busy / locked).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Database(async_sqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _))) => {
                matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
            }
            Self::Database(_) => false,
        }
    }

    /// Returns `true` when a UNIQUE or foreign-key constraint rejected the write.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            Self::Database(async_sqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _)))
                if e.code == ErrorCode::ConstraintViolation
        )
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Database(async_sqlite::Error::Rusqlite(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(code: std::ffi::c_int) -> StoreError {
        StoreError::from(rusqlite::Error::SqliteFailure(rusqlite::ffi::Error::new(code), None))
    }

    #[test]
    fn test_busy_and_locked_are_transient() {
        assert!(failure(rusqlite::ffi::SQLITE_BUSY).is_transient());
        assert!(failure(rusqlite::ffi::SQLITE_LOCKED).is_transient());
        assert!(!failure(rusqlite::ffi::SQLITE_CONSTRAINT).is_transient());
        assert!(failure(rusqlite::ffi::SQLITE_CONSTRAINT).is_constraint_violation());
        assert!(!StoreError::Database(async_sqlite::Error::Closed).is_transient());
    }
}
