//! # Ledger Operations
//!
//! Write operations on the transaction ledger: sales, expenses, returns,
//! the expense sign-off transitions, and credit settlement.
//!
//! ## Write Discipline
//! Every operation here follows the same shape:
//!
//! 1. Gate check — refuse with `Offline` before anything is recorded
//! 2. Open-shift check — writes need an active shift
//! 3. Pure validation (register-core)
//! 4. One repository call (atomic at the store level)
//!
//! Entries are append-only. Nothing in this module edits an existing row
//! beyond its status flags; a correction is a new return entry.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::{RegisterError, RegisterResult};
use crate::Register;
use register_core::validation::{
    customer_key, validate_amount, validate_credit_split, validate_insurance_split,
};
use register_core::{
    credit_outstanding_by_customer, CreditStatus, CustomerCredit, Money, PaymentMethod, SaleSplit,
    Transaction, TransactionKind, TransactionStatus, ValidationError,
};
use register_db::DbError;

// =============================================================================
// Request Types
// =============================================================================

/// How a submitted sale divides between payers.
///
/// Mirrors [`SaleSplit`] minus the derived fields (the covered amount and
/// the credit bookkeeping are computed, not submitted).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "split", rename_all = "snake_case")]
pub enum SplitRequest {
    /// Plain sale.
    None,
    /// Insurance-split sale.
    Insurance {
        insurer_id: String,
        card_id: String,
        coverage_percent: i64,
    },
    /// Credit sale; the full amount becomes customer debt.
    Credit {
        customer_name: String,
        customer_phone: Option<String>,
    },
}

/// A sale submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleRequest {
    pub amount: Money,
    pub method: PaymentMethod,
    pub description: Option<String>,
    pub split: SplitRequest,
    pub cashier_id: String,
}

// =============================================================================
// Ledger Writes
// =============================================================================

impl Register {
    /// Records a sale (plain, insurance-split, or credit).
    ///
    /// ## Derivations
    /// - Insurance: `covered = round(amount × coverage_percent / 100)`;
    ///   the patient part is whatever remains.
    /// - Credit: kind becomes `CreditSale`, method becomes `CreditDebt`
    ///   regardless of what was submitted, debt starts `Unpaid`.
    ///
    /// Sales are approved on submission; only expenses pend.
    pub async fn record_sale(&self, req: SaleRequest) -> RegisterResult<Transaction> {
        self.gate.require_online()?;
        let shift = self.require_active_shift().await?;
        validate_amount(req.amount)?;

        let (kind, method, split) = match req.split {
            SplitRequest::None => (TransactionKind::Sale, req.method, SaleSplit::None),

            SplitRequest::Insurance {
                insurer_id,
                card_id,
                coverage_percent,
            } => {
                let percent = validate_insurance_split(&insurer_id, &card_id, coverage_percent)?;
                let (covered, _patient) = req.amount.split_percentage(percent);
                (
                    TransactionKind::Sale,
                    req.method,
                    SaleSplit::Insurance {
                        insurer_id,
                        card_id,
                        coverage_percent: percent,
                        covered_amount: covered,
                    },
                )
            }

            SplitRequest::Credit {
                customer_name,
                customer_phone,
            } => {
                validate_credit_split(&customer_name)?;
                (
                    TransactionKind::CreditSale,
                    PaymentMethod::CreditDebt,
                    SaleSplit::Credit {
                        customer_name,
                        customer_phone,
                        status: CreditStatus::Unpaid,
                        paid_by: None,
                        paid_at: None,
                    },
                )
            }
        };

        let tx = Transaction {
            id: Uuid::new_v4().to_string(),
            shift_id: shift.id,
            kind,
            amount: req.amount,
            method,
            status: TransactionStatus::Approved,
            description: req.description,
            split,
            original_id: None,
            created_by: req.cashier_id,
            created_at: Utc::now(),
            approved_by: None,
            approved_at: None,
        };

        self.db.transactions().insert(&tx).await?;
        info!(id = %tx.id, kind = kind.as_str(), amount = %tx.amount, "Sale recorded");
        Ok(tx)
    }

    /// Records an expense. Expenses start `Pending` and only count toward
    /// the drawer once an admin approves them (and only cash-method ones
    /// touch the drawer at all).
    pub async fn record_expense(
        &self,
        amount: Money,
        description: String,
        method: PaymentMethod,
        cashier_id: String,
    ) -> RegisterResult<Transaction> {
        self.gate.require_online()?;
        let shift = self.require_active_shift().await?;
        validate_amount(amount)?;
        if description.trim().is_empty() {
            return Err(ValidationError::required("expense description").into());
        }

        let tx = Transaction {
            id: Uuid::new_v4().to_string(),
            shift_id: shift.id,
            kind: TransactionKind::Expense,
            amount,
            method,
            status: TransactionStatus::Pending,
            description: Some(description),
            split: SaleSplit::None,
            original_id: None,
            created_by: cashier_id,
            created_at: Utc::now(),
            approved_by: None,
            approved_at: None,
        };

        self.db.transactions().insert(&tx).await?;
        info!(id = %tx.id, amount = %tx.amount, "Expense recorded, pending sign-off");
        Ok(tx)
    }

    /// Records a return against an earlier transaction.
    ///
    /// The original is marked `Returned` and a negative-amount reversal
    /// carrying the original's payment method is appended; both writes
    /// share one store transaction. The original is never edited beyond
    /// its status flag.
    pub async fn record_return(
        &self,
        original_id: &str,
        cashier_id: String,
    ) -> RegisterResult<Transaction> {
        self.gate.require_online()?;
        let shift = self.require_active_shift().await?;

        let original = self
            .db
            .transactions()
            .get_by_id(original_id)
            .await?
            .ok_or_else(|| RegisterError::Store(DbError::not_found("Transaction", original_id)))?;

        let returnable = matches!(
            original.kind,
            TransactionKind::Sale | TransactionKind::CreditSale
        ) && original.status == TransactionStatus::Approved;
        if !returnable {
            return Err(ValidationError::NotReturnable {
                id: original.id,
                status: original.status.as_str().to_string(),
            }
            .into());
        }

        let reversal = Transaction {
            id: Uuid::new_v4().to_string(),
            // The return lands on the shift it happens in, which may not be
            // the shift of the original sale.
            shift_id: shift.id,
            kind: TransactionKind::Return,
            amount: -original.amount,
            method: original.method,
            status: TransactionStatus::Approved,
            description: original.description.clone(),
            split: SaleSplit::None,
            original_id: Some(original.id.clone()),
            created_by: cashier_id,
            created_at: Utc::now(),
            approved_by: None,
            approved_at: None,
        };

        self.db
            .transactions()
            .mark_returned_and_insert(&original.id, &reversal)
            .await?;
        info!(original = %original.id, reversal = %reversal.id, "Return recorded");
        Ok(reversal)
    }

    /// Approves a pending expense.
    pub async fn approve_expense(
        &self,
        expense_id: &str,
        admin_id: String,
    ) -> RegisterResult<Transaction> {
        self.decide_expense(expense_id, TransactionStatus::Approved, admin_id)
            .await
    }

    /// Rejects a pending expense. Rejection is terminal; the amount never
    /// counts toward the drawer.
    pub async fn reject_expense(
        &self,
        expense_id: &str,
        admin_id: String,
    ) -> RegisterResult<Transaction> {
        self.decide_expense(expense_id, TransactionStatus::Rejected, admin_id)
            .await
    }

    async fn decide_expense(
        &self,
        expense_id: &str,
        status: TransactionStatus,
        admin_id: String,
    ) -> RegisterResult<Transaction> {
        self.gate.require_online()?;

        match self
            .db
            .transactions()
            .set_expense_status(expense_id, status, &admin_id, Utc::now())
            .await
        {
            Ok(()) => {}
            // Zero rows matched: not an expense, or already decided.
            Err(DbError::NotFound { .. }) => {
                return Err(ValidationError::NotPendingExpense {
                    id: expense_id.to_string(),
                }
                .into())
            }
            Err(other) => return Err(other.into()),
        }

        let tx = self
            .db
            .transactions()
            .get_by_id(expense_id)
            .await?
            .ok_or_else(|| RegisterError::Store(DbError::not_found("Transaction", expense_id)))?;
        info!(id = %tx.id, status = status.as_str(), by = %admin_id, "Expense decided");
        Ok(tx)
    }

    /// Settles a customer's entire outstanding credit balance.
    ///
    /// One store-level UPDATE grouped on the normalized customer key flips
    /// every unpaid row at once; a partially-settled customer is never
    /// observable. Returns the number of sales settled (zero when the
    /// customer had no outstanding debt).
    pub async fn settle_credit(
        &self,
        customer_name: &str,
        customer_phone: Option<&str>,
        admin_id: String,
    ) -> RegisterResult<u64> {
        self.gate.require_online()?;
        validate_credit_split(customer_name)?;

        let key = customer_key(customer_name, customer_phone);
        let settled = self
            .db
            .transactions()
            .settle_credit(&key, &admin_id, Utc::now())
            .await?;
        info!(customer = %customer_name, settled, "Credit settled");
        Ok(settled)
    }

    // =========================================================================
    // Ledger Reads (never gated)
    // =========================================================================

    /// All transactions for a shift in chronological order.
    pub async fn shift_transactions(&self, shift_id: &str) -> RegisterResult<Vec<Transaction>> {
        Ok(self.db.transactions().list_for_shift(shift_id).await?)
    }

    /// Expenses still awaiting sign-off for a shift.
    pub async fn pending_expenses(&self, shift_id: &str) -> RegisterResult<Vec<Transaction>> {
        Ok(self.db.transactions().list_pending_expenses(shift_id).await?)
    }

    /// Outstanding credit grouped per customer (the debts screen).
    pub async fn outstanding_credit(&self) -> RegisterResult<Vec<CustomerCredit>> {
        let unpaid = self.db.transactions().list_unpaid_credit().await?;
        Ok(credit_outstanding_by_customer(&unpaid))
    }
}
