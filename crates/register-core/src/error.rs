//! # Error Types
//!
//! Domain-specific error types for register-core.
//!
//! ## Error Hierarchy
//! ```text
//! register-core errors (this file)
//! └── ValidationError  - Business rule violations on input
//!
//! register-db errors (separate crate)
//! └── DbError          - Backing store failures
//!
//! register-service errors (separate crate)
//! └── RegisterError    - What presentation layers see
//!
//! Flow: ValidationError → RegisterError → presentation
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (id, amount, etc.)
//! 3. Errors are enum variants, never String
//! 4. Validation failures are correctable by the user and never retried

use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when a submitted operation violates a business precondition.
/// They are surfaced to the cashier as a correctable message.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// An amount that must be strictly positive was zero or negative.
    #[error("amount must be positive, got {amount}")]
    AmountNotPositive { amount: i64 },

    /// A required field is missing or empty.
    ///
    /// ## When This Occurs
    /// - Credit sale submitted without a customer name
    /// - Insurance split without an insurer or card id
    #[error("{field} is required")]
    Required { field: String },

    /// Insurance coverage percent outside the [0, 100] range.
    #[error("coverage percent must be between 0 and 100, got {percent}")]
    CoverageOutOfRange { percent: i64 },

    /// Approve/reject attempted on something other than a pending expense.
    ///
    /// Approval transitions are terminal: once approved or rejected there is
    /// no path back to pending.
    #[error("transaction {id} is not a pending expense")]
    NotPendingExpense { id: String },

    /// Return attempted against a transaction that cannot be reversed.
    ///
    /// ## When This Occurs
    /// - Original is already returned (double return)
    /// - Original is a pending or rejected expense
    /// - Original is itself a return entry
    #[error("transaction {id} cannot be returned (status: {status})")]
    NotReturnable { id: String, status: String },

    /// Write attempted against a shift that is not open.
    #[error("shift {id} is not open")]
    ShiftNotOpen { id: String },
}

impl ValidationError {
    /// Creates a Required error for a named field.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with ValidationError.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ValidationError::AmountNotPositive { amount: -500 };
        assert_eq!(err.to_string(), "amount must be positive, got -500");

        let err = ValidationError::required("customer name");
        assert_eq!(err.to_string(), "customer name is required");

        let err = ValidationError::CoverageOutOfRange { percent: 140 };
        assert_eq!(
            err.to_string(),
            "coverage percent must be between 0 and 100, got 140"
        );
    }
}
