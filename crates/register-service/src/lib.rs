//! # register-service: Operation Surface for the Cash Register
//!
//! The single crate presentation layers talk to. Wraps the pure logic of
//! `register-core` and the SQLite store of `register-db` behind one
//! [`Register`] facade.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Presentation (external)                    │
//! │    sales screen ─ expenses ─ debts ─ close-out ─ history    │
//! └──────────────────────────┬──────────────────────────────────┘
//!                            │
//! ┌──────────────────────────▼──────────────────────────────────┐
//! │            ★ register-service (THIS CRATE) ★                │
//! │                                                             │
//! │   ┌─────────┐ ┌──────────┐ ┌─────────────────────────────┐  │
//! │   │ ledger  │ │  shifts  │ │      connectivity gate      │  │
//! │   │ writes  │ │lifecycle │ │  probe loop ─ write refusal │  │
//! │   └─────────┘ └──────────┘ └─────────────────────────────┘  │
//! └──────────────────────────┬──────────────────────────────────┘
//!                            │
//!               register-core │ register-db
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! let db = Database::new(DbConfig::new("/var/lib/register/register.db")).await?;
//! let register = Register::new(db.clone());
//! let probe = register.gate().start_probe(db, GateConfig::default());
//!
//! register.start_shift("cashier-a".into()).await?;
//! register.record_sale(SaleRequest { /* … */ }).await?;
//! let summary = register.close_shift(counted, "cashier-a".into()).await?;
//!
//! probe.shutdown().await;
//! ```

pub mod error;
pub mod gate;
pub mod ledger;
pub mod shifts;

pub use error::{RegisterError, RegisterResult};
pub use gate::{ConnectivityGate, GateConfig, ProbeHandle};
pub use ledger::{SaleRequest, SplitRequest};

// Re-export the types callers handle
pub use register_core::{
    CustomerCredit, Money, PaymentMethod, ReconciliationOutcome, ReconciliationSummary, Shift,
    Transaction, TransactionKind, TransactionStatus,
};
pub use register_db::{Database, DbConfig};

// =============================================================================
// Register Facade
// =============================================================================

/// The register's operation surface.
///
/// Cheap to clone; clones share the pool and the connectivity flag. The
/// operations themselves live in [`ledger`] and [`shifts`].
#[derive(Debug, Clone)]
pub struct Register {
    pub(crate) db: Database,
    pub(crate) gate: ConnectivityGate,
}

impl Register {
    /// Creates a register over an open database. The gate starts online.
    pub fn new(db: Database) -> Self {
        Register {
            db,
            gate: ConnectivityGate::new(),
        }
    }

    /// Creates a register sharing an existing gate.
    pub fn with_gate(db: Database, gate: ConnectivityGate) -> Self {
        Register { db, gate }
    }

    /// The connectivity gate (for the probe loop and OS reachability hooks).
    pub fn gate(&self) -> &ConnectivityGate {
        &self.gate
    }

    /// The underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }
}

// =============================================================================
// End-to-End Scenario Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use register_core::ValidationError;

    fn init_logging() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "info".into()),
            )
            .with_test_writer()
            .try_init();
    }

    async fn test_register() -> Register {
        init_logging();
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        Register::new(db)
    }

    fn cash_sale(amount: i64) -> SaleRequest {
        SaleRequest {
            amount: Money::from_amount(amount),
            method: PaymentMethod::Cash,
            description: None,
            split: SplitRequest::None,
            cashier_id: "cashier-a".to_string(),
        }
    }

    #[tokio::test]
    async fn test_plain_cash_day_balances() {
        let register = test_register().await;
        register.start_shift("cashier-a".to_string()).await.unwrap();
        register.record_sale(cash_sale(100_000)).await.unwrap();

        let summary = register
            .close_shift(Money::from_amount(100_000), "cashier-a".to_string())
            .await
            .unwrap();

        assert_eq!(summary.expected_cash.amount(), 100_000);
        assert_eq!(summary.cash_difference, Money::zero());
        assert_eq!(summary.outcome, ReconciliationOutcome::Balanced);
        assert_eq!(summary.net_cash_to_remit.amount(), 100_000);

        // The closed shift carries the recorded count
        let history = register.shift_history(5).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].actual_cash, Some(Money::from_amount(100_000)));
    }

    #[tokio::test]
    async fn test_insurance_sale_splits_drawer_and_receivable() {
        let register = test_register().await;
        register.start_shift("cashier-a".to_string()).await.unwrap();

        let sale = register
            .record_sale(SaleRequest {
                amount: Money::from_amount(100_000),
                method: PaymentMethod::Cash,
                description: None,
                split: SplitRequest::Insurance {
                    insurer_id: "rssb".to_string(),
                    card_id: "card-7".to_string(),
                    coverage_percent: 80,
                },
                cashier_id: "cashier-a".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(sale.patient_part().amount(), 20_000);

        let preview = register
            .reconciliation_preview(Money::from_amount(20_000))
            .await
            .unwrap();
        assert_eq!(preview.expected_cash.amount(), 20_000);
        assert_eq!(preview.insurance_receivable.amount(), 80_000);
        assert_eq!(preview.outcome, ReconciliationOutcome::Balanced);
    }

    #[tokio::test]
    async fn test_coverage_out_of_range_is_refused() {
        let register = test_register().await;
        register.start_shift("cashier-a".to_string()).await.unwrap();

        let err = register
            .record_sale(SaleRequest {
                amount: Money::from_amount(10_000),
                method: PaymentMethod::Cash,
                description: None,
                split: SplitRequest::Insurance {
                    insurer_id: "rssb".to_string(),
                    card_id: "card-7".to_string(),
                    coverage_percent: 140,
                },
                cashier_id: "cashier-a".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RegisterError::Validation(ValidationError::CoverageOutOfRange { .. })
        ));
    }

    #[tokio::test]
    async fn test_expense_counts_only_after_approval() {
        let register = test_register().await;
        register.start_shift("cashier-a".to_string()).await.unwrap();
        register.record_sale(cash_sale(50_000)).await.unwrap();

        let expense = register
            .record_expense(
                Money::from_amount(10_000),
                "transport".to_string(),
                PaymentMethod::Cash,
                "cashier-a".to_string(),
            )
            .await
            .unwrap();
        assert_eq!(expense.status, TransactionStatus::Pending);

        // Pending: the drawer expectation ignores it
        let preview = register
            .reconciliation_preview(Money::from_amount(50_000))
            .await
            .unwrap();
        assert_eq!(preview.expected_cash.amount(), 50_000);

        register
            .approve_expense(&expense.id, "admin-1".to_string())
            .await
            .unwrap();

        let preview = register
            .reconciliation_preview(Money::from_amount(40_000))
            .await
            .unwrap();
        assert_eq!(preview.expected_cash.amount(), 40_000);
        assert_eq!(preview.outcome, ReconciliationOutcome::Balanced);

        // The decision is terminal
        let err = register
            .reject_expense(&expense.id, "admin-2".to_string())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RegisterError::Validation(ValidationError::NotPendingExpense { .. })
        ));
    }

    #[tokio::test]
    async fn test_return_reverses_the_drawer() {
        let register = test_register().await;
        register.start_shift("cashier-a".to_string()).await.unwrap();
        let sale = register.record_sale(cash_sale(30_000)).await.unwrap();

        let reversal = register
            .record_return(&sale.id, "cashier-a".to_string())
            .await
            .unwrap();
        assert_eq!(reversal.amount.amount(), -30_000);
        assert_eq!(reversal.original_id.as_deref(), Some(sale.id.as_str()));

        let preview = register
            .reconciliation_preview(Money::zero())
            .await
            .unwrap();
        assert_eq!(preview.expected_cash, Money::zero());
        assert_eq!(preview.outcome, ReconciliationOutcome::Balanced);

        // Double return is refused
        let err = register
            .record_return(&sale.id, "cashier-a".to_string())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RegisterError::Validation(ValidationError::NotReturnable { .. })
        ));
    }

    #[tokio::test]
    async fn test_credit_sale_and_settlement() {
        let register = test_register().await;
        register.start_shift("cashier-a".to_string()).await.unwrap();

        for amount in [10_000, 15_000] {
            register
                .record_sale(SaleRequest {
                    amount: Money::from_amount(amount),
                    // Submitted method is overridden for credit sales
                    method: PaymentMethod::Cash,
                    description: None,
                    split: SplitRequest::Credit {
                        customer_name: "Uwase Claudine".to_string(),
                        customer_phone: Some("0788 123 456".to_string()),
                    },
                    cashier_id: "cashier-a".to_string(),
                })
                .await
                .unwrap();
        }

        // No cash moved; the debt is outstanding
        let preview = register
            .reconciliation_preview(Money::zero())
            .await
            .unwrap();
        assert_eq!(preview.expected_cash, Money::zero());
        assert_eq!(preview.credit_outstanding.amount(), 25_000);

        let debts = register.outstanding_credit().await.unwrap();
        assert_eq!(debts.len(), 1);
        assert_eq!(debts[0].outstanding.amount(), 25_000);
        assert_eq!(debts[0].sale_count, 2);

        let settled = register
            .settle_credit("uwase claudine", Some("0788123456"), "admin-1".to_string())
            .await
            .unwrap();
        assert_eq!(settled, 2);
        assert!(register.outstanding_credit().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_returned_credit_sale_is_refunded_not_owed() {
        let register = test_register().await;
        register.start_shift("cashier-a".to_string()).await.unwrap();

        let sale = register
            .record_sale(SaleRequest {
                amount: Money::from_amount(20_000),
                method: PaymentMethod::Cash,
                description: None,
                split: SplitRequest::Credit {
                    customer_name: "Jean Bosco".to_string(),
                    customer_phone: None,
                },
                cashier_id: "cashier-a".to_string(),
            })
            .await
            .unwrap();

        register
            .record_return(&sale.id, "cashier-a".to_string())
            .await
            .unwrap();

        // Summary and debts screen agree: nothing outstanding
        let preview = register
            .reconciliation_preview(Money::zero())
            .await
            .unwrap();
        assert_eq!(preview.credit_outstanding, Money::zero());
        assert!(register.outstanding_credit().await.unwrap().is_empty());

        // And the refunded debt cannot be settled
        let settled = register
            .settle_credit("Jean Bosco", None, "admin-1".to_string())
            .await
            .unwrap();
        assert_eq!(settled, 0);
    }

    #[tokio::test]
    async fn test_credit_sale_requires_customer_name() {
        let register = test_register().await;
        register.start_shift("cashier-a".to_string()).await.unwrap();

        let err = register
            .record_sale(SaleRequest {
                amount: Money::from_amount(5_000),
                method: PaymentMethod::Cash,
                description: None,
                split: SplitRequest::Credit {
                    customer_name: "   ".to_string(),
                    customer_phone: None,
                },
                cashier_id: "cashier-a".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RegisterError::Validation(ValidationError::Required { .. })
        ));
    }

    #[tokio::test]
    async fn test_second_shift_conflict_names_the_blocker() {
        let register = test_register().await;
        register.start_shift("cashier-a".to_string()).await.unwrap();

        let err = register
            .start_shift("cashier-b".to_string())
            .await
            .unwrap_err();
        match err {
            RegisterError::ActiveShiftConflict { cashier_id, .. } => {
                assert_eq!(cashier_id, "cashier-a");
            }
            other => panic!("expected conflict, got {other:?}"),
        }

        // Closing frees the register
        register
            .close_shift(Money::zero(), "cashier-a".to_string())
            .await
            .unwrap();
        register.start_shift("cashier-b".to_string()).await.unwrap();
    }

    #[tokio::test]
    async fn test_force_close_recovers_a_stuck_register() {
        let register = test_register().await;
        register.start_shift("cashier-a".to_string()).await.unwrap();

        let closed = register
            .force_close_shift("admin-1".to_string())
            .await
            .unwrap();
        assert!(!closed.is_open());
        assert_eq!(closed.actual_cash, None);
        assert_eq!(closed.cash_difference, None);

        register.start_shift("cashier-b".to_string()).await.unwrap();
    }

    #[tokio::test]
    async fn test_offline_refuses_writes_but_not_reads() {
        let register = test_register().await;
        register.start_shift("cashier-a".to_string()).await.unwrap();
        register.record_sale(cash_sale(10_000)).await.unwrap();

        register.gate().set_online(false);

        let err = register.record_sale(cash_sale(5_000)).await.unwrap_err();
        assert!(matches!(err, RegisterError::Offline));
        let err = register
            .close_shift(Money::from_amount(10_000), "cashier-a".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, RegisterError::Offline));

        // Reads still work, and nothing was recorded while offline
        let shift = register.active_shift().await.unwrap().unwrap();
        let txs = register.shift_transactions(&shift.id).await.unwrap();
        assert_eq!(txs.len(), 1);
        let preview = register
            .reconciliation_preview(Money::from_amount(10_000))
            .await
            .unwrap();
        assert_eq!(preview.outcome, ReconciliationOutcome::Balanced);

        // Recovery: the same close goes through
        register.gate().set_online(true);
        register
            .close_shift(Money::from_amount(10_000), "cashier-a".to_string())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_writes_require_an_open_shift() {
        let register = test_register().await;
        let err = register.record_sale(cash_sale(1_000)).await.unwrap_err();
        assert!(matches!(err, RegisterError::NoActiveShift));

        let err = register
            .close_shift(Money::zero(), "cashier-a".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, RegisterError::NoActiveShift));
    }

    #[tokio::test]
    async fn test_shortage_is_recorded_not_blocked() {
        let register = test_register().await;
        register.start_shift("cashier-a".to_string()).await.unwrap();
        register.record_sale(cash_sale(100_000)).await.unwrap();

        let summary = register
            .close_shift(Money::from_amount(98_500), "cashier-a".to_string())
            .await
            .unwrap();
        assert_eq!(summary.outcome, ReconciliationOutcome::Shortage);
        assert_eq!(summary.cash_difference.amount(), -1_500);

        let history = register.shift_history(1).await.unwrap();
        assert_eq!(
            history[0].cash_difference,
            Some(Money::from_amount(-1_500))
        );
    }
}
