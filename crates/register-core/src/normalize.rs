//! # Normalizers
//!
//! Maps heterogeneous persisted records onto canonical domain types.
//!
//! ## Why This Module Exists
//! The register has lived through several schema generations. Older rows
//! carry different column names (`insurance_company_id` vs `insurer_id`,
//! `client_name` vs `customer_name`), a boolean approval flag instead of a
//! status column, and free-form payment method spellings, some of them
//! localized. All of that variance is absorbed HERE and nowhere else:
//! every other component operates solely on [`Transaction`] and never
//! branches on schema shape.
//!
//! ## Fallback Policy
//! Both normalizers are total functions with named fallback branches:
//!
//! - unrecognized payment method → `Cash`
//! - unrecognized transaction kind → `Sale`
//!
//! These are deliberate backward-compatibility defaults, not errors. They
//! can silently miscategorize malformed data; changing that needs product
//! guidance, so tests assert the fallback directly instead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{
    CreditStatus, PaymentMethod, SaleSplit, Transaction, TransactionKind, TransactionStatus,
};

// =============================================================================
// Payment Method Normalizer
// =============================================================================

impl PaymentMethod {
    /// Maps an arbitrary persisted string to a canonical payment method.
    ///
    /// Case- and whitespace-insensitive. Recognizes canonical values,
    /// legacy spellings, and localized labels.
    ///
    /// ## Fallback
    /// Anything unrecognized maps to `Cash`. Legacy rows predating the
    /// method column rely on this.
    pub fn normalize(raw: &str) -> PaymentMethod {
        let folded = fold_token(raw);
        match folded.as_str() {
            "cash" | "especes" | "espèces" | "amafaranga" => PaymentMethod::Cash,
            "mobile_money" | "mobilemoney" | "momo" | "mtn_momo" | "airtel_money" | "mobile" => {
                PaymentMethod::MobileMoney
            }
            "credit_debt" | "creditdebt" | "credit" | "debt" | "dette" | "crédit" | "ideni" => {
                PaymentMethod::CreditDebt
            }
            // Named fallback: unknown spellings are treated as cash for
            // backward compatibility with pre-normalization rows.
            _ => PaymentMethod::Cash,
        }
    }
}

impl TransactionKind {
    /// Maps an arbitrary persisted string to a canonical kind.
    ///
    /// ## Fallback
    /// Unknown kinds map to `Sale`.
    pub fn normalize(raw: &str) -> TransactionKind {
        match fold_token(raw).as_str() {
            "sale" | "vente" => TransactionKind::Sale,
            "expense" | "expenses" | "depense" | "dépense" => TransactionKind::Expense,
            "return" | "refund" | "retour" => TransactionKind::Return,
            "credit_sale" | "creditsale" | "credit" => TransactionKind::CreditSale,
            // Named fallback: unknown kinds are sales.
            _ => TransactionKind::Sale,
        }
    }
}

/// Lowercases and collapses separators so `"Mobile Money"`, `"MOBILE-MONEY"`
/// and `"mobile_money"` all compare equal.
fn fold_token(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .replace([' ', '-'], "_")
}

// =============================================================================
// Raw Transaction Record
// =============================================================================

/// A persisted transaction row as the backing store hands it over.
///
/// One deserializable shape whose serde aliases absorb every column name
/// the schema has ever used. All fields beyond the identifying trio are
/// optional; [`normalize_transaction`] fills the gaps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTransactionRecord {
    pub id: String,

    #[serde(alias = "shiftId")]
    pub shift_id: String,

    pub amount: i64,

    /// Transaction kind; old rows spell it `type`.
    #[serde(default, alias = "type", alias = "transaction_type")]
    pub kind: Option<String>,

    #[serde(default, alias = "paymentMethod", alias = "payment_mode", alias = "method")]
    pub payment_method: Option<String>,

    #[serde(default)]
    pub status: Option<String>,

    /// Legacy boolean approval flag, superseded by `status`.
    #[serde(default, alias = "is_approved", alias = "isApproved")]
    pub approved: Option<bool>,

    #[serde(default)]
    pub description: Option<String>,

    // -- insurance group (modern / legacy names) ------------------------------
    #[serde(default, alias = "insurance_company_id", alias = "insurerId")]
    pub insurer_id: Option<String>,

    #[serde(default, alias = "insurance_card_no", alias = "cardId")]
    pub card_id: Option<String>,

    #[serde(default, alias = "insurance_rate", alias = "coveragePercent")]
    pub coverage_percent: Option<f64>,

    #[serde(
        default,
        alias = "insurance_paid",
        alias = "amountCoveredByInsurance",
        alias = "amount_covered_by_insurance"
    )]
    pub covered_amount: Option<i64>,

    // -- credit group (modern / legacy names) ---------------------------------
    #[serde(default, alias = "client_name", alias = "customerName")]
    pub customer_name: Option<String>,

    #[serde(default, alias = "client_phone", alias = "customerPhone")]
    pub customer_phone: Option<String>,

    #[serde(default, alias = "credit_status", alias = "paymentStatus")]
    pub payment_status: Option<String>,

    #[serde(default, alias = "paidBy")]
    pub paid_by: Option<String>,

    #[serde(default, alias = "paidAt")]
    pub paid_at: Option<DateTime<Utc>>,

    // -- bookkeeping ----------------------------------------------------------
    #[serde(default, alias = "original_transaction_id", alias = "originalTransactionId")]
    pub original_id: Option<String>,

    #[serde(default, alias = "createdBy")]
    pub created_by: Option<String>,

    #[serde(default, alias = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, alias = "approvedBy")]
    pub approved_by: Option<String>,

    #[serde(default, alias = "approvedAt")]
    pub approved_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Transaction Normalizer
// =============================================================================

/// Converts a raw persisted record into a canonical [`Transaction`].
///
/// ## Derivation Rules
/// - **Kind**: mapped case-insensitively; unknown → `Sale`.
/// - **Split**: a credit-sale kind (or a non-empty customer name with no
///   insurance evidence) yields `SaleSplit::Credit` and coerces the kind to
///   `CreditSale` and the method to `CreditDebt`. Insurance evidence on a
///   sale yields `SaleSplit::Insurance`; a stored covered amount is kept
///   as-is, otherwise it is recomputed from the coverage percentage.
/// - **Status**: explicit status column → legacy `approved` flag →
///   kind-based default (expenses pend sign-off, everything else is
///   approved on submission).
///
/// Idempotent: normalizing an already-canonical record changes nothing.
pub fn normalize_transaction(raw: RawTransactionRecord) -> Transaction {
    let amount = Money::from_amount(raw.amount);
    let mut kind = raw
        .kind
        .as_deref()
        .map(TransactionKind::normalize)
        .unwrap_or(TransactionKind::Sale);

    let customer_name = non_empty(raw.customer_name);
    let has_insurance_evidence = non_empty(raw.insurer_id.clone()).is_some()
        || non_empty(raw.card_id.clone()).is_some()
        || raw.coverage_percent.is_some()
        || raw.covered_amount.is_some();

    let split = if kind == TransactionKind::CreditSale
        || (!has_insurance_evidence && customer_name.is_some())
    {
        kind = TransactionKind::CreditSale;
        SaleSplit::Credit {
            customer_name: customer_name.unwrap_or_default(),
            customer_phone: non_empty(raw.customer_phone),
            status: match raw.payment_status.as_deref().map(fold_token).as_deref() {
                Some("paid") | Some("settled") => CreditStatus::Paid,
                _ => CreditStatus::Unpaid,
            },
            paid_by: non_empty(raw.paid_by),
            paid_at: raw.paid_at,
        }
    } else if has_insurance_evidence && kind == TransactionKind::Sale {
        let coverage_percent = raw
            .coverage_percent
            .map(|p| p.round().clamp(0.0, 100.0) as u8)
            .unwrap_or(0);
        let covered_amount = raw
            .covered_amount
            .map(Money::from_amount)
            .unwrap_or_else(|| amount.split_percentage(coverage_percent).0);
        SaleSplit::Insurance {
            insurer_id: non_empty(raw.insurer_id).unwrap_or_default(),
            card_id: non_empty(raw.card_id).unwrap_or_default(),
            coverage_percent,
            covered_amount,
        }
    } else {
        SaleSplit::None
    };

    let method = if kind == TransactionKind::CreditSale {
        PaymentMethod::CreditDebt
    } else {
        raw.payment_method
            .as_deref()
            .map(PaymentMethod::normalize)
            .unwrap_or(PaymentMethod::Cash)
    };

    let status = derive_status(raw.status.as_deref(), raw.approved, kind);

    Transaction {
        id: raw.id,
        shift_id: raw.shift_id,
        kind,
        amount,
        method,
        status,
        description: non_empty(raw.description),
        split,
        original_id: non_empty(raw.original_id),
        created_by: non_empty(raw.created_by).unwrap_or_else(|| "unknown".to_string()),
        // Missing timestamps sort first rather than failing the read.
        created_at: raw.created_at.unwrap_or(DateTime::UNIX_EPOCH),
        approved_by: non_empty(raw.approved_by),
        approved_at: raw.approved_at,
    }
}

/// Status derivation order: explicit column → legacy flag → kind default.
fn derive_status(
    status: Option<&str>,
    approved: Option<bool>,
    kind: TransactionKind,
) -> TransactionStatus {
    if let Some(s) = status {
        match fold_token(s).as_str() {
            "pending" => return TransactionStatus::Pending,
            "approved" => return TransactionStatus::Approved,
            "rejected" => return TransactionStatus::Rejected,
            "returned" => return TransactionStatus::Returned,
            _ => {} // unparseable status falls through to the legacy flag
        }
    }

    if let Some(flag) = approved {
        return if flag {
            TransactionStatus::Approved
        } else {
            TransactionStatus::Pending
        };
    }

    // Only expenses require sign-off.
    match kind {
        TransactionKind::Expense => TransactionStatus::Pending,
        _ => TransactionStatus::Approved,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// =============================================================================
// Canonical → Raw (for persistence and the idempotence property)
// =============================================================================

impl Transaction {
    /// Flattens a canonical transaction back into the persisted shape.
    ///
    /// `normalize_transaction(tx.to_raw()) == tx` for any canonical `tx`.
    pub fn to_raw(&self) -> RawTransactionRecord {
        let mut raw = RawTransactionRecord {
            id: self.id.clone(),
            shift_id: self.shift_id.clone(),
            amount: self.amount.amount(),
            kind: Some(self.kind.as_str().to_string()),
            payment_method: Some(self.method.as_str().to_string()),
            status: Some(self.status.as_str().to_string()),
            approved: None,
            description: self.description.clone(),
            original_id: self.original_id.clone(),
            created_by: Some(self.created_by.clone()),
            created_at: Some(self.created_at),
            approved_by: self.approved_by.clone(),
            approved_at: self.approved_at,
            ..Default::default()
        };

        match &self.split {
            SaleSplit::None => {}
            SaleSplit::Insurance {
                insurer_id,
                card_id,
                coverage_percent,
                covered_amount,
            } => {
                raw.insurer_id = Some(insurer_id.clone());
                raw.card_id = Some(card_id.clone());
                raw.coverage_percent = Some(*coverage_percent as f64);
                raw.covered_amount = Some(covered_amount.amount());
            }
            SaleSplit::Credit {
                customer_name,
                customer_phone,
                status,
                paid_by,
                paid_at,
            } => {
                raw.customer_name = Some(customer_name.clone());
                raw.customer_phone = customer_phone.clone();
                raw.payment_status = Some(
                    match status {
                        CreditStatus::Unpaid => "unpaid",
                        CreditStatus::Paid => "paid",
                    }
                    .to_string(),
                );
                raw.paid_by = paid_by.clone();
                raw.paid_at = *paid_at;
            }
        }

        raw
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
