//! # Reconciliation Math
//!
//! Pure aggregations over a shift's transactions and the expected-cash
//! computation used at close time.
//!
//! ## Expected Cash
//! ```text
//! expected_cash = Σ patient parts of cash-method sales
//!               − Σ approved cash-method expenses
//!               − Σ |cash-method returns|
//!
//! Credit sales contribute 0: no cash moves at sale time.
//! ```
//!
//! Everything in this module is a pure function over already-fetched rows;
//! the service layer feeds it and persists the outcome.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::money::Money;
use crate::types::{
    CreditStatus, PaymentMethod, SaleSplit, Transaction, TransactionKind, TransactionStatus,
};
use crate::validation::customer_key;

// =============================================================================
// Ledger Totals
// =============================================================================

/// Aggregated totals over one shift's ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTotals {
    /// Patient parts of cash-method sales.
    pub cash_total: Money,
    /// Patient parts of mobile-money sales.
    pub mobile_money_total: Money,
    /// Insurer-payable portions awaiting reimbursement.
    pub insurance_receivable: Money,
    /// Unpaid credit-sale debt.
    pub credit_outstanding: Money,
    /// Approved expenses, all payment methods.
    pub approved_expense_total: Money,
    /// Approved expenses paid from the cash drawer.
    pub cash_expense_total: Money,
    /// Magnitudes of all return entries.
    pub returns_total: Money,
    /// Magnitudes of returns whose original was paid in cash.
    pub cash_returns_total: Money,
}

/// Computes all ledger totals in one pass.
pub fn ledger_totals(transactions: &[Transaction]) -> LedgerTotals {
    let mut totals = LedgerTotals::default();

    for tx in transactions {
        match tx.kind {
            TransactionKind::Sale => {
                // Returned sales still count here; the matching return
                // entry carries the offset.
                match tx.method {
                    PaymentMethod::Cash => totals.cash_total += tx.patient_part(),
                    PaymentMethod::MobileMoney => {
                        totals.mobile_money_total += tx.patient_part()
                    }
                    PaymentMethod::CreditDebt => {}
                }
                totals.insurance_receivable += tx.split.covered_amount();
            }

            TransactionKind::CreditSale => {
                // A returned credit sale is refunded debt, not outstanding
                // debt; only approved rows still owe.
                if tx.status == TransactionStatus::Approved {
                    if let SaleSplit::Credit {
                        status: CreditStatus::Unpaid,
                        ..
                    } = tx.split
                    {
                        totals.credit_outstanding += tx.amount;
                    }
                }
            }

            TransactionKind::Expense => {
                if tx.status == TransactionStatus::Approved {
                    totals.approved_expense_total += tx.amount;
                    if tx.method == PaymentMethod::Cash {
                        totals.cash_expense_total += tx.amount;
                    }
                }
            }

            TransactionKind::Return => {
                let magnitude = tx.amount.abs();
                totals.returns_total += magnitude;
                // Return entries carry the original's payment method.
                if tx.method == PaymentMethod::Cash {
                    totals.cash_returns_total += magnitude;
                }
            }
        }
    }

    totals
}

/// Theoretical drawer cash for the shift.
pub fn expected_cash(totals: &LedgerTotals) -> Money {
    totals.cash_total - totals.cash_expense_total - totals.cash_returns_total
}

// =============================================================================
// Credit Outstanding Grouped By Customer
// =============================================================================

/// One customer's outstanding credit balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerCredit {
    /// Normalized (name, phone) settlement key.
    pub customer_key: String,
    /// Display name from the most recent entry.
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub outstanding: Money,
    pub sale_count: usize,
}

/// Groups unpaid credit sales by the normalized customer key.
///
/// Output order is stable (sorted by key) so the debts screen doesn't
/// shuffle between refreshes.
pub fn credit_outstanding_by_customer(transactions: &[Transaction]) -> Vec<CustomerCredit> {
    let mut grouped: BTreeMap<String, CustomerCredit> = BTreeMap::new();

    for tx in transactions {
        // Same filter as the outstanding total: returned credit sales are
        // refunded, not owed.
        if tx.kind != TransactionKind::CreditSale || tx.status != TransactionStatus::Approved {
            continue;
        }
        let SaleSplit::Credit {
            customer_name,
            customer_phone,
            status: CreditStatus::Unpaid,
            ..
        } = &tx.split
        else {
            continue;
        };

        let key = customer_key(customer_name, customer_phone.as_deref());
        let entry = grouped
            .entry(key.clone())
            .or_insert_with(|| CustomerCredit {
                customer_key: key,
                customer_name: customer_name.clone(),
                customer_phone: customer_phone.clone(),
                outstanding: Money::zero(),
                sale_count: 0,
            });
        entry.outstanding += tx.amount;
        entry.sale_count += 1;
    }

    grouped.into_values().collect()
}

// =============================================================================
// Reconciliation Outcome
// =============================================================================

/// Classification of the counted-vs-expected comparison.
///
/// Informational only: closing always succeeds regardless of outcome. The
/// register records discrepancies rather than blocking on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationOutcome {
    Balanced,
    Shortage,
    Surplus,
}

impl ReconciliationOutcome {
    /// Classifies a cash difference.
    ///
    /// Amounts are integers, so the float register's "within 0.01" balanced
    /// band is exact equality here.
    pub fn classify(difference: Money) -> Self {
        if difference.is_zero() {
            ReconciliationOutcome::Balanced
        } else if difference.is_negative() {
            ReconciliationOutcome::Shortage
        } else {
            ReconciliationOutcome::Surplus
        }
    }
}

// =============================================================================
// Reconciliation Summary
// =============================================================================

/// The closing summary handed back to presentation and export collaborators.
///
/// Derived at close time and stored onto the closing shift; never persisted
/// as an independent entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    pub shift_id: String,
    pub expected_cash: Money,
    pub counted_cash: Money,
    /// `counted − expected`.
    pub cash_difference: Money,
    pub outcome: ReconciliationOutcome,
    pub cash_total: Money,
    pub mobile_money_total: Money,
    pub insurance_receivable: Money,
    pub credit_outstanding: Money,
    pub expense_total: Money,
    pub returns_total: Money,
    /// `cash + mobile money − returns − expenses`.
    pub net_cash_to_remit: Money,
}

/// Builds the reconciliation summary for a shift.
pub fn build_summary(
    shift_id: &str,
    transactions: &[Transaction],
    counted_cash: Money,
) -> ReconciliationSummary {
    let totals = ledger_totals(transactions);
    let expected = expected_cash(&totals);
    let difference = counted_cash - expected;

    ReconciliationSummary {
        shift_id: shift_id.to_string(),
        expected_cash: expected,
        counted_cash,
        cash_difference: difference,
        outcome: ReconciliationOutcome::classify(difference),
        cash_total: totals.cash_total,
        mobile_money_total: totals.mobile_money_total,
        insurance_receivable: totals.insurance_receivable,
        credit_outstanding: totals.credit_outstanding,
        expense_total: totals.approved_expense_total,
        returns_total: totals.returns_total,
        net_cash_to_remit: totals.cash_total + totals.mobile_money_total
            - totals.returns_total
            - totals.approved_expense_total,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
