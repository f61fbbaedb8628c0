//! # register-core: Pure Business Logic for the Cash Register
//!
//! This crate is the heart of the register. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  Presentation (external)                        │
//! │     sales screen ─ expenses ─ debts ─ close-out ─ history       │
//! └────────────────────────────┬────────────────────────────────────┘
//!                              │
//! ┌────────────────────────────▼────────────────────────────────────┐
//! │              register-service (operation surface)               │
//! │   ledger ─ shift lifecycle ─ reconciliation ─ connectivity gate │
//! └────────────────────────────┬────────────────────────────────────┘
//!                              │
//! ┌────────────────────────────▼────────────────────────────────────┐
//! │              ★ register-core (THIS CRATE) ★                     │
//! │                                                                 │
//! │   ┌─────────┐ ┌───────────┐ ┌───────────┐ ┌────────────────┐   │
//! │   │  money  │ │   types   │ │ normalize │ │   reconcile    │   │
//! │   │  Money  │ │   Shift   │ │  methods  │ │ totals, summary│   │
//! │   │  splits │ │Transaction│ │  records  │ │ expected cash  │   │
//! │   └─────────┘ └───────────┘ └───────────┘ └────────────────┘   │
//! │                                                                 │
//! │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │
//! └────────────────────────────┬────────────────────────────────────┘
//!                              │
//! ┌────────────────────────────▼────────────────────────────────────┐
//! │                register-db (backing store)                      │
//! │          SQLite queries, migrations, repositories               │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Canonical domain types (Shift, Transaction, SaleSplit, ...)
//! - [`money`] - Integer money with percentage splitting
//! - [`normalize`] - Payment method and transaction normalizers
//! - [`reconcile`] - Ledger aggregations and the closing summary
//! - [`validation`] - Business rule validation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure functions**: same input, same output, every time
//! 2. **No I/O**: database, network, and clocks live in other crates
//! 3. **Integer money**: whole-franc i64 amounts, no floating point
//! 4. **Explicit errors**: typed errors, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod normalize;
pub mod reconcile;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{ValidationError, ValidationResult};
pub use money::Money;
pub use normalize::{normalize_transaction, RawTransactionRecord};
pub use reconcile::{
    build_summary, credit_outstanding_by_customer, expected_cash, ledger_totals, CustomerCredit,
    LedgerTotals, ReconciliationOutcome, ReconciliationSummary,
};
pub use types::*;
