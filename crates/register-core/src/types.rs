//! # Domain Types
//!
//! Canonical domain types for the cash-register core.
//!
//! ## Type Hierarchy
//! ```text
//! ┌──────────────────┐    ┌───────────────────┐   ┌──────────────────┐
//! │      Shift       │    │   Transaction     │   │    SaleSplit     │
//! │  ──────────────  │    │  ───────────────  │   │  ──────────────  │
//! │  id (UUID)       │◄───│  shift_id (FK)    │   │  None            │
//! │  cashier_id      │    │  kind / status    │   │  Insurance {..}  │
//! │  started_at      │    │  amount / method  │   │  Credit {..}     │
//! │  ended_at?       │    │  split            │──►│                  │
//! │  closing fields  │    │  original_id?     │   │  (tagged; both-  │
//! └──────────────────┘    └───────────────────┘   │  present state   │
//!                                                 │  is unrepresent- │
//!                                                 │  able)           │
//!                                                 └──────────────────┘
//! ```
//!
//! ## Invariants carried by construction
//! - `Shift::ended_at == None` marks the active shift; the store allows at
//!   most one such row system-wide.
//! - Insurance and credit fields live in one tagged `SaleSplit` enum, so a
//!   record can never carry both groups at once.
//! - Returns are separate negative-amount entries referencing the original
//!   via `original_id`; originals are never edited in place beyond their
//!   status flag.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Payment Method
// =============================================================================

/// How a transaction was (or will be) paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash in the drawer.
    Cash,
    /// Mobile money transfer (MoMo and friends).
    MobileMoney,
    /// No money moved at sale time; the amount is customer debt.
    CreditDebt,
}

impl PaymentMethod {
    /// Stable string form, matching the stored column value.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::MobileMoney => "mobile_money",
            PaymentMethod::CreditDebt => "credit_debt",
        }
    }
}

// =============================================================================
// Transaction Kind
// =============================================================================

/// The kind of ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// A completed sale (plain or insurance-split).
    Sale,
    /// A drawer expense awaiting (or past) admin sign-off.
    Expense,
    /// A negative-amount reversal of an earlier transaction.
    Return,
    /// A sale recorded as customer debt.
    CreditSale,
}

impl TransactionKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Sale => "sale",
            TransactionKind::Expense => "expense",
            TransactionKind::Return => "return",
            TransactionKind::CreditSale => "credit_sale",
        }
    }
}

// =============================================================================
// Transaction Status
// =============================================================================

/// Lifecycle status of a transaction.
///
/// Only expenses start out `Pending`; sales and credit sales are approved on
/// submission. `Approved → Rejected` and `Pending → Rejected` transitions are
/// terminal, as is `Returned`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Approved,
    Rejected,
    Returned,
}

impl TransactionStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Approved => "approved",
            TransactionStatus::Rejected => "rejected",
            TransactionStatus::Returned => "returned",
        }
    }
}

// =============================================================================
// Credit Status
// =============================================================================

/// Repayment status of a credit sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum CreditStatus {
    Unpaid,
    Paid,
}

// =============================================================================
// Sale Split
// =============================================================================

/// How a sale divides between payers.
///
/// Insurance and credit field groups are mutually exclusive on a record;
/// modeling them as a tagged enum makes the invalid "both present" state
/// unrepresentable rather than merely checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "split", rename_all = "snake_case")]
pub enum SaleSplit {
    /// Plain sale: the customer pays the full amount.
    None,

    /// Insurance split: the insurer covers a percentage, the patient pays
    /// the remainder.
    Insurance {
        insurer_id: String,
        card_id: String,
        /// Coverage percentage in [0, 100].
        coverage_percent: u8,
        /// Insurer-payable portion: `round(amount × coverage_percent / 100)`.
        covered_amount: Money,
    },

    /// Credit sale: the full amount becomes customer debt.
    Credit {
        customer_name: String,
        customer_phone: Option<String>,
        status: CreditStatus,
        /// Admin who settled the debt, once paid.
        paid_by: Option<String>,
        paid_at: Option<DateTime<Utc>>,
    },
}

impl SaleSplit {
    /// Returns the insurer-covered portion (zero for non-insurance splits).
    pub fn covered_amount(&self) -> Money {
        match self {
            SaleSplit::Insurance { covered_amount, .. } => *covered_amount,
            _ => Money::zero(),
        }
    }

    pub fn is_insurance(&self) -> bool {
        matches!(self, SaleSplit::Insurance { .. })
    }

    pub fn is_credit(&self) -> bool {
        matches!(self, SaleSplit::Credit { .. })
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// A canonical ledger entry.
///
/// Created by the ledger on submission; mutated only for status transitions
/// (approve/reject, unpaid → paid) or marked `Returned` by a later return
/// entry referencing it through `original_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,

    /// Owning shift (foreign key).
    pub shift_id: String,

    pub kind: TransactionKind,

    /// Magnitude of the entry. Negative only for returns.
    pub amount: Money,

    pub method: PaymentMethod,

    pub status: TransactionStatus,

    /// Free-text description (expenses mostly).
    pub description: Option<String>,

    /// Insurance/credit split; `SaleSplit::None` for plain entries.
    #[serde(flatten)]
    pub split: SaleSplit,

    /// For returns: the transaction being reversed.
    pub original_id: Option<String>,

    pub created_by: String,
    pub created_at: DateTime<Utc>,

    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
}

impl Transaction {
    /// The portion the patient pays out of pocket.
    ///
    /// For sales with an insurance split this is
    /// `max(0, amount − covered_amount)`; every other kind pays (or refunds)
    /// the full amount.
    pub fn patient_part(&self) -> Money {
        match (self.kind, &self.split) {
            (TransactionKind::Sale, SaleSplit::Insurance { covered_amount, .. }) => {
                let part = self.amount - *covered_amount;
                if part.is_negative() {
                    Money::zero()
                } else {
                    part
                }
            }
            _ => self.amount,
        }
    }
}

// =============================================================================
// Close Reason
// =============================================================================

/// Why a shift was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// Regular cashier close-out with a counted drawer.
    Normal,
    /// Administrative override; no cash count was taken.
    ForcedByAdmin,
}

// =============================================================================
// Shift
// =============================================================================

/// A bounded period during which one cashier operates the register.
///
/// `ended_at == None` marks the active shift. The backing store enforces
/// that at most one such row exists system-wide; see the partial unique
/// index in the initial migration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Shift {
    pub id: String,
    pub cashier_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,

    /// Computed drawer expectation; zero until close.
    pub expected_cash: Money,

    /// Physically counted cash at close. Unset for forced closes.
    pub actual_cash: Option<Money>,

    /// `actual − expected`. Unset for forced closes.
    pub cash_difference: Option<Money>,

    pub closed_by: Option<String>,
    pub close_reason: Option<CloseReason>,
}

impl Shift {
    /// Whether this shift is still open.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }

    /// Elapsed time since the shift started.
    ///
    /// Derived on every display tick, never persisted.
    pub fn duration_at(&self, now: DateTime<Utc>) -> Duration {
        self.ended_at.unwrap_or(now) - self.started_at
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sale(amount: i64, split: SaleSplit) -> Transaction {
        Transaction {
            id: "tx-1".to_string(),
            shift_id: "shift-1".to_string(),
            kind: TransactionKind::Sale,
            amount: Money::from_amount(amount),
            method: PaymentMethod::Cash,
            status: TransactionStatus::Approved,
            description: None,
            split,
            original_id: None,
            created_by: "cashier-1".to_string(),
            created_at: Utc::now(),
            approved_by: None,
            approved_at: None,
        }
    }

    #[test]
    fn test_patient_part_plain_sale() {
        let tx = sale(100_000, SaleSplit::None);
        assert_eq!(tx.patient_part().amount(), 100_000);
    }

    #[test]
    fn test_patient_part_insurance_sale() {
        let tx = sale(
            100_000,
            SaleSplit::Insurance {
                insurer_id: "ins-1".to_string(),
                card_id: "card-9".to_string(),
                coverage_percent: 80,
                covered_amount: Money::from_amount(80_000),
            },
        );
        assert_eq!(tx.patient_part().amount(), 20_000);
    }

    #[test]
    fn test_patient_part_never_negative() {
        // Corrupt data: covered more than the sale amount
        let tx = sale(
            10_000,
            SaleSplit::Insurance {
                insurer_id: "ins-1".to_string(),
                card_id: "card-9".to_string(),
                coverage_percent: 100,
                covered_amount: Money::from_amount(15_000),
            },
        );
        assert_eq!(tx.patient_part(), Money::zero());
    }

    #[test]
    fn test_patient_part_other_kinds_use_full_amount() {
        let mut tx = sale(50_000, SaleSplit::None);
        tx.kind = TransactionKind::Expense;
        assert_eq!(tx.patient_part().amount(), 50_000);

        tx.kind = TransactionKind::Return;
        tx.amount = Money::from_amount(-50_000);
        assert_eq!(tx.patient_part().amount(), -50_000);
    }

    #[test]
    fn test_shift_is_open() {
        let now = Utc::now();
        let mut shift = Shift {
            id: "shift-1".to_string(),
            cashier_id: "cashier-1".to_string(),
            started_at: now,
            ended_at: None,
            expected_cash: Money::zero(),
            actual_cash: None,
            cash_difference: None,
            closed_by: None,
            close_reason: None,
        };
        assert!(shift.is_open());

        shift.ended_at = Some(now + Duration::hours(8));
        assert!(!shift.is_open());
        assert_eq!(shift.duration_at(now).num_hours(), 8);
    }

    #[test]
    fn test_split_serde_tag_round_trip() {
        let split = SaleSplit::Credit {
            customer_name: "Jean Bosco".to_string(),
            customer_phone: Some("0788000111".to_string()),
            status: CreditStatus::Unpaid,
            paid_by: None,
            paid_at: None,
        };
        let json = serde_json::to_string(&split).unwrap();
        assert!(json.contains("\"split\":\"credit\""));
        let back: SaleSplit = serde_json::from_str(&json).unwrap();
        assert_eq!(back, split);
    }
}
