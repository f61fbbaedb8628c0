//! # Database Error Types
//!
//! Error types for backing-store operations.
//!
//! ## Error Flow
//! ```text
//! SQLite error (sqlx::Error)
//!      │
//!      ▼
//! DbError (this module)  ← adds context and categorization
//!      │
//!      ▼
//! RegisterError (service crate)  ← what presentation sees
//! ```
//!
//! Two mappings matter beyond the generic ones:
//!
//! - A UNIQUE violation on the `one_open_shift` index is the authoritative
//!   signal of the start-shift race and becomes [`DbError::OpenShiftExists`].
//! - "no such column" / "no such table" means the store has not been
//!   migrated for a feature yet and becomes [`DbError::SchemaMismatch`] —
//!   surfaced distinctly because retrying cannot succeed.

use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found (or no longer in the state the operation requires).
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The store refused a second open shift.
    ///
    /// Raised by the partial unique index `one_open_shift`; overrides any
    /// application-level pre-check that raced past.
    #[error("an open shift already exists")]
    OpenShiftExists,

    /// Unique constraint violation other than the open-shift guard.
    #[error("unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    /// Foreign key constraint violation.
    #[error("foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// The store lacks expected columns or tables.
    ///
    /// ## When This Occurs
    /// - Credit-sale columns not yet provisioned on an old deployment
    /// - Migration skipped or rolled back out-of-band
    #[error("store schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Database connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Multi-statement transaction failed.
    #[error("transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound            → DbError::NotFound
/// UNIQUE on one_open_shift            → DbError::OpenShiftExists
/// other UNIQUE violation              → DbError::UniqueViolation
/// FOREIGN KEY violation               → DbError::ForeignKeyViolation
/// "no such column" / "no such table"  → DbError::SchemaMismatch
/// sqlx::Error::PoolTimedOut           → DbError::PoolExhausted
/// Other                               → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message().to_string();

                if msg.contains("UNIQUE constraint failed") {
                    if msg.contains("one_open_shift") {
                        DbError::OpenShiftExists
                    } else {
                        let constraint = msg
                            .split("UNIQUE constraint failed: ")
                            .nth(1)
                            .unwrap_or("unknown")
                            .to_string();
                        DbError::UniqueViolation { constraint }
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation { message: msg }
                } else if msg.contains("no such column") || msg.contains("no such table") {
                    DbError::SchemaMismatch(msg)
                } else {
                    DbError::QueryFailed(msg)
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_missing_column_maps_to_schema_mismatch() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let err = sqlx::query("SELECT settlement_batch FROM transactions")
            .execute(db.pool())
            .await
            .map_err(DbError::from)
            .unwrap_err();
        assert!(matches!(err, DbError::SchemaMismatch(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_missing_table_maps_to_schema_mismatch() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let err = sqlx::query("SELECT id FROM settlement_batches")
            .execute(db.pool())
            .await
            .map_err(DbError::from)
            .unwrap_err();
        assert!(matches!(err, DbError::SchemaMismatch(_)), "got {err:?}");
    }
}
