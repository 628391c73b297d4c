//! Error types for ledger operations

use thiserror::Error;

/// Result type alias for ledger operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while reading or writing the ledger
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// A uniqueness constraint rejected the insert
    #[error("Record already exists: {0}")]
    Conflict(String),

    /// The referenced run does not exist
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    /// Backend failure (connection, I/O, constraint other than uniqueness)
    #[error("Database error: {0}")]
    Database(String),

    /// Schema setup failed
    #[error("Migration error: {0}")]
    Migration(String),

    /// Details could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Check if this error is a uniqueness conflict
    ///
    /// Conflicts mean the row is already recorded; every other variant is a
    /// genuine store failure.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

#[cfg(feature = "sqlite")]
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(db.message().to_string())
            }
            other => StoreError::Database(other.to_string()),
        }
    }
}

#[cfg(feature = "sqlite")]
impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::Migration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_detection() {
        assert!(StoreError::Conflict("open_buckets.bucket_name".to_string()).is_conflict());
        assert!(!StoreError::Database("disk I/O error".to_string()).is_conflict());
        assert!(!StoreError::RunNotFound(3).is_conflict());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            StoreError::Conflict("mybucket".to_string()).to_string(),
            "Record already exists: mybucket"
        );
        assert_eq!(StoreError::RunNotFound(7).to_string(), "Run not found: 7");
    }

    #[test]
    fn test_from_json_error() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        assert!(matches!(StoreError::from(err), StoreError::Serialization(_)));
    }
}
