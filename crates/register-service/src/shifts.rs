//! # Shift Lifecycle
//!
//! Starting, closing, and force-closing shifts, plus the reconciliation
//! preview.
//!
//! ## Single Active Shift
//! ```text
//! start_shift()
//!   │
//!   ├─ advisory pre-check: get_active() → conflict names the cashier
//!   │                                      whose shift is in the way
//!   └─ INSERT ── the store's partial unique index is authoritative;
//!                two racing starts both pass the pre-check and the
//!                second INSERT fails, mapped to the same conflict.
//! ```
//!
//! ## Closing
//! Closing always succeeds regardless of reconciliation outcome: a
//! shortage is recorded, not blocked on. Force-close skips the count
//! entirely and leaves the reconciliation fields unset.

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{RegisterError, RegisterResult};
use crate::Register;
use register_core::{build_summary, Money, ReconciliationSummary, Shift};
use register_db::DbError;

impl Register {
    /// Starts a shift for the given cashier.
    ///
    /// ## Errors
    /// `ActiveShiftConflict` naming the cashier whose shift is still open.
    pub async fn start_shift(&self, cashier_id: String) -> RegisterResult<Shift> {
        self.gate.require_online()?;

        // Advisory pre-check for a friendly error; the index below is the
        // real enforcement.
        if let Some(active) = self.db.shifts().get_active().await? {
            return Err(conflict_from(&active));
        }

        let shift = Shift {
            id: Uuid::new_v4().to_string(),
            cashier_id,
            started_at: Utc::now(),
            ended_at: None,
            expected_cash: Money::zero(),
            actual_cash: None,
            cash_difference: None,
            closed_by: None,
            close_reason: None,
        };

        match self.db.shifts().insert(&shift).await {
            Ok(()) => {
                info!(id = %shift.id, cashier = %shift.cashier_id, "Shift started");
                Ok(shift)
            }
            Err(DbError::OpenShiftExists) => {
                // Lost the race: someone else's INSERT landed between the
                // pre-check and ours. Re-fetch to name them.
                warn!(cashier = %shift.cashier_id, "Shift start lost the open-shift race");
                match self.db.shifts().get_active().await? {
                    Some(active) => Err(conflict_from(&active)),
                    None => Err(RegisterError::Store(DbError::OpenShiftExists)),
                }
            }
            Err(other) => Err(other.into()),
        }
    }

    /// The currently open shift, if any.
    pub async fn active_shift(&self) -> RegisterResult<Option<Shift>> {
        Ok(self.db.shifts().get_active().await?)
    }

    /// The open shift, or `NoActiveShift`. Every ledger write goes through
    /// this.
    pub(crate) async fn require_active_shift(&self) -> RegisterResult<Shift> {
        self.db
            .shifts()
            .get_active()
            .await?
            .ok_or(RegisterError::NoActiveShift)
    }

    /// Closes the active shift against a counted drawer.
    ///
    /// Computes expected cash from the shift's ledger, records the
    /// difference, and returns the full reconciliation summary. A shortage
    /// or surplus never blocks the close.
    pub async fn close_shift(
        &self,
        counted_cash: Money,
        closed_by: String,
    ) -> RegisterResult<ReconciliationSummary> {
        self.gate.require_online()?;
        let shift = self.require_active_shift().await?;

        let transactions = self.db.transactions().list_for_shift(&shift.id).await?;
        let summary = build_summary(&shift.id, &transactions, counted_cash);

        self.db
            .shifts()
            .close(
                &shift.id,
                Utc::now(),
                summary.expected_cash,
                summary.counted_cash,
                summary.cash_difference,
                &closed_by,
            )
            .await?;

        info!(
            id = %shift.id,
            expected = %summary.expected_cash,
            counted = %summary.counted_cash,
            outcome = ?summary.outcome,
            "Shift closed"
        );
        Ok(summary)
    }

    /// Force-closes the active shift without a cash count.
    ///
    /// Admin recovery for a shift left open. No reconciliation fields are
    /// recorded; the close reason marks the shift for follow-up.
    pub async fn force_close_shift(&self, admin_id: String) -> RegisterResult<Shift> {
        self.gate.require_online()?;
        let shift = self.require_active_shift().await?;

        self.db
            .shifts()
            .force_close(&shift.id, Utc::now(), &admin_id)
            .await?;
        warn!(id = %shift.id, by = %admin_id, "Shift force-closed without a count");

        self.db
            .shifts()
            .get_by_id(&shift.id)
            .await?
            .ok_or_else(|| RegisterError::Store(DbError::not_found("Shift", &shift.id)))
    }

    /// Reconciliation preview for the active shift.
    ///
    /// Same math as [`Register::close_shift`] without persisting anything;
    /// the close-out screen refreshes this as the cashier counts. Reads are
    /// never gated.
    pub async fn reconciliation_preview(
        &self,
        counted_cash: Money,
    ) -> RegisterResult<ReconciliationSummary> {
        let shift = self.require_active_shift().await?;
        let transactions = self.db.transactions().list_for_shift(&shift.id).await?;
        Ok(build_summary(&shift.id, &transactions, counted_cash))
    }

    /// Recently closed shifts, newest first.
    pub async fn shift_history(&self, limit: i64) -> RegisterResult<Vec<Shift>> {
        Ok(self.db.shifts().list_recent_closed(limit).await?)
    }
}

fn conflict_from(active: &Shift) -> RegisterError {
    RegisterError::ActiveShiftConflict {
        cashier_id: active.cashier_id.clone(),
        started_at: active.started_at,
    }
}
