//! # Shift Repository
//!
//! Database operations for shift rows.
//!
//! ## Shift Lifecycle
//! ```text
//! 1. OPEN
//!    └── insert() → Shift { ended_at: None }
//!        The one_open_shift partial unique index refuses a second open
//!        row; the violation surfaces as DbError::OpenShiftExists.
//!
//! 2. CLOSE (exactly one of)
//!    ├── close()       → counted drawer, reconciliation fields set
//!    └── force_close() → admin override, expected/actual left unset
//!
//! Shifts are never deleted.
//! ```

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use register_core::{CloseReason, Money, Shift};

const SHIFT_COLUMNS: &str = "id, cashier_id, started_at, ended_at, expected_cash, \
     actual_cash, cash_difference, closed_by, close_reason";

/// Repository for shift database operations.
#[derive(Debug, Clone)]
pub struct ShiftRepository {
    pool: SqlitePool,
}

impl ShiftRepository {
    /// Creates a new ShiftRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ShiftRepository { pool }
    }

    /// Inserts a freshly opened shift.
    ///
    /// ## Errors
    /// `DbError::OpenShiftExists` when another shift is still open. This is
    /// the authoritative signal for the start-shift race; callers must
    /// treat it the same as their advisory pre-check firing.
    pub async fn insert(&self, shift: &Shift) -> DbResult<()> {
        debug!(id = %shift.id, cashier = %shift.cashier_id, "Inserting shift");

        sqlx::query(
            "INSERT INTO shifts (id, cashier_id, started_at, ended_at, expected_cash, \
             actual_cash, cash_difference, closed_by, close_reason) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&shift.id)
        .bind(&shift.cashier_id)
        .bind(shift.started_at)
        .bind(shift.ended_at)
        .bind(shift.expected_cash)
        .bind(shift.actual_cash)
        .bind(shift.cash_difference)
        .bind(&shift.closed_by)
        .bind(shift.close_reason)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(())
    }

    /// Gets a shift by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Shift>> {
        let shift = sqlx::query_as::<_, Shift>(&format!(
            "SELECT {SHIFT_COLUMNS} FROM shifts WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(shift)
    }

    /// Gets the active shift, if any.
    ///
    /// The partial unique index guarantees at most one row matches.
    pub async fn get_active(&self) -> DbResult<Option<Shift>> {
        let shift = sqlx::query_as::<_, Shift>(&format!(
            "SELECT {SHIFT_COLUMNS} FROM shifts WHERE ended_at IS NULL LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await?;

        Ok(shift)
    }

    /// Closes a shift normally, persisting the reconciliation fields.
    ///
    /// ## Conditional Write
    /// The `ended_at IS NULL` guard makes the close idempotence-safe: a
    /// second close of the same shift affects zero rows and errors instead
    /// of overwriting the recorded count.
    #[allow(clippy::too_many_arguments)]
    pub async fn close(
        &self,
        id: &str,
        ended_at: chrono::DateTime<chrono::Utc>,
        expected_cash: Money,
        actual_cash: Money,
        cash_difference: Money,
        closed_by: &str,
    ) -> DbResult<()> {
        debug!(id = %id, closed_by = %closed_by, "Closing shift");

        let result = sqlx::query(
            "UPDATE shifts SET ended_at = ?2, expected_cash = ?3, actual_cash = ?4, \
             cash_difference = ?5, closed_by = ?6, close_reason = ?7 \
             WHERE id = ?1 AND ended_at IS NULL",
        )
        .bind(id)
        .bind(ended_at)
        .bind(expected_cash)
        .bind(actual_cash)
        .bind(cash_difference)
        .bind(closed_by)
        .bind(CloseReason::Normal)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Open shift", id));
        }

        Ok(())
    }

    /// Force-closes a shift, skipping the counted-cash step.
    ///
    /// Recovers from a cashier who never closed out. Expected/actual stay
    /// unset; only the end timestamp, the closer, and the reason are set.
    pub async fn force_close(
        &self,
        id: &str,
        ended_at: chrono::DateTime<chrono::Utc>,
        closed_by: &str,
    ) -> DbResult<()> {
        debug!(id = %id, closed_by = %closed_by, "Force-closing shift");

        let result = sqlx::query(
            "UPDATE shifts SET ended_at = ?2, closed_by = ?3, close_reason = ?4 \
             WHERE id = ?1 AND ended_at IS NULL",
        )
        .bind(id)
        .bind(ended_at)
        .bind(closed_by)
        .bind(CloseReason::ForcedByAdmin)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Open shift", id));
        }

        Ok(())
    }

    /// Lists recently closed shifts, newest first (the history screen).
    pub async fn list_recent_closed(&self, limit: i64) -> DbResult<Vec<Shift>> {
        let shifts = sqlx::query_as::<_, Shift>(&format!(
            "SELECT {SHIFT_COLUMNS} FROM shifts WHERE ended_at IS NOT NULL \
             ORDER BY started_at DESC LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(shifts)
    }

    /// Counts open shifts. The store invariant keeps this ≤ 1; exposed so
    /// tests can assert it directly.
    pub async fn count_open(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM shifts WHERE ended_at IS NULL")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
