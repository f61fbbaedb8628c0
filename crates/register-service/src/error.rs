//! # Service Error Types
//!
//! The error surface presentation layers see.
//!
//! ## Error Flow
//! ```text
//! ValidationError (register-core) ──┐
//! DbError (register-db) ────────────┼──► RegisterError (this module)
//! connectivity gate ────────────────┘
//! ```
//!
//! ## Retry Policy
//! No variant is retried automatically. Validation failures are
//! correctable by the user; `Offline` clears on its own when the probe
//! recovers; `SchemaMismatch` cannot succeed on retry at all. Surfacing
//! the failure and leaving the decision to a human is the policy.

use chrono::{DateTime, Utc};
use thiserror::Error;

use register_core::ValidationError;
use register_db::DbError;

/// Errors surfaced by register operations.
#[derive(Debug, Error)]
pub enum RegisterError {
    /// A business precondition failed. Correctable by the user.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A shift start was refused because another shift is still open.
    ///
    /// Names the conflicting cashier so the message on screen reads
    /// "X's shift is still open", not just "conflict".
    #[error("{cashier_id} has an open shift (started {started_at})")]
    ActiveShiftConflict {
        cashier_id: String,
        started_at: DateTime<Utc>,
    },

    /// A write was attempted with no shift open.
    #[error("no shift is currently open")]
    NoActiveShift,

    /// The connectivity gate refused a write while the store is unreachable.
    ///
    /// Nothing was recorded; the cashier retries once the banner clears.
    #[error("register is offline; the entry was not recorded")]
    Offline,

    /// The store lacks columns or tables an operation needs.
    ///
    /// Distinct from [`RegisterError::Store`] because retrying cannot
    /// succeed; the deployment needs its migrations run.
    #[error("store schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Any other backing-store failure.
    #[error("store error: {0}")]
    Store(DbError),
}

impl From<DbError> for RegisterError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::SchemaMismatch(msg) => RegisterError::SchemaMismatch(msg),
            other => RegisterError::Store(other),
        }
    }
}

/// Result type for register operations.
pub type RegisterResult<T> = Result<T, RegisterError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_mismatch_routes_distinctly() {
        let err: RegisterError =
            DbError::SchemaMismatch("no such column: customer_key".to_string()).into();
        assert!(matches!(err, RegisterError::SchemaMismatch(_)));

        let err: RegisterError = DbError::PoolExhausted.into();
        assert!(matches!(err, RegisterError::Store(_)));
    }

    #[test]
    fn test_conflict_message_names_the_cashier() {
        let err = RegisterError::ActiveShiftConflict {
            cashier_id: "cashier-a".to_string(),
            started_at: Utc::now(),
        };
        assert!(err.to_string().contains("cashier-a"));
    }
}
