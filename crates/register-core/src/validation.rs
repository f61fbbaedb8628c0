//! # Validation Module
//!
//! Business rule validation for ledger submissions.
//!
//! ## Validation Strategy
//! ```text
//! Layer 1: Presentation          - format checks, immediate feedback
//! Layer 2: THIS MODULE           - business preconditions (pure)
//! Layer 3: Backing store         - NOT NULL / CHECK / partial unique index
//!
//! Defense in depth: the store-level constraints stay authoritative even
//! when a caller skips this layer.
//! ```

use crate::error::{ValidationError, ValidationResult};
use crate::money::Money;

// =============================================================================
// Amount Validators
// =============================================================================

/// Validates a submitted amount.
///
/// ## Rules
/// - Must be strictly positive. Returns are recorded through the dedicated
///   return operation, never by submitting negative amounts directly.
pub fn validate_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::AmountNotPositive {
            amount: amount.amount(),
        });
    }
    Ok(())
}

// =============================================================================
// Split Validators
// =============================================================================

/// Validates an insurance split request.
///
/// ## Rules
/// - `coverage_percent` ∈ [0, 100]
/// - insurer id and card id both present and non-empty
///
/// ## Returns
/// The coverage percentage narrowed to `u8`.
pub fn validate_insurance_split(
    insurer_id: &str,
    card_id: &str,
    coverage_percent: i64,
) -> ValidationResult<u8> {
    if !(0..=100).contains(&coverage_percent) {
        return Err(ValidationError::CoverageOutOfRange {
            percent: coverage_percent,
        });
    }
    if insurer_id.trim().is_empty() {
        return Err(ValidationError::required("insurer id"));
    }
    if card_id.trim().is_empty() {
        return Err(ValidationError::required("insurance card id"));
    }
    Ok(coverage_percent as u8)
}

/// Validates a credit split request.
///
/// ## Rules
/// - Customer name must be non-empty (the phone is optional; plenty of
///   regulars are known by name only).
pub fn validate_credit_split(customer_name: &str) -> ValidationResult<()> {
    if customer_name.trim().is_empty() {
        return Err(ValidationError::required("customer name"));
    }
    Ok(())
}

// =============================================================================
// Customer Key
// =============================================================================

/// Normalizes a (name, phone) pair into the settlement grouping key.
///
/// Credit settlement flips every unpaid row sharing this key, so the key
/// must be stable across spelling noise: the name is lowercased with
/// whitespace collapsed, the phone keeps digits only.
///
/// ## Example
/// ```rust
/// use register_core::validation::customer_key;
///
/// assert_eq!(
///     customer_key("  Uwase  Claudine ", Some("0788 123-456")),
///     customer_key("uwase claudine", Some("0788123456")),
/// );
/// ```
pub fn customer_key(name: &str, phone: Option<&str>) -> String {
    let name_part = name
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");
    let phone_part: String = phone
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    format!("{}|{}", name_part, phone_part)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(Money::from_amount(1)).is_ok());
        assert!(validate_amount(Money::from_amount(100_000)).is_ok());
        assert!(validate_amount(Money::zero()).is_err());
        assert!(validate_amount(Money::from_amount(-500)).is_err());
    }

    #[test]
    fn test_validate_insurance_split() {
        assert_eq!(validate_insurance_split("rssb", "card-1", 80), Ok(80));
        assert_eq!(validate_insurance_split("rssb", "card-1", 0), Ok(0));
        assert_eq!(validate_insurance_split("rssb", "card-1", 100), Ok(100));

        assert!(validate_insurance_split("rssb", "card-1", 101).is_err());
        assert!(validate_insurance_split("rssb", "card-1", -1).is_err());
        assert!(validate_insurance_split("", "card-1", 80).is_err());
        assert!(validate_insurance_split("rssb", "  ", 80).is_err());
    }

    #[test]
    fn test_validate_credit_split() {
        assert!(validate_credit_split("Jean Bosco").is_ok());
        assert!(validate_credit_split("").is_err());
        assert!(validate_credit_split("   ").is_err());
    }

    #[test]
    fn test_customer_key_normalization() {
        assert_eq!(
            customer_key("  Uwase  Claudine ", Some("0788 123-456")),
            "uwase claudine|0788123456"
        );
        assert_eq!(customer_key("JEAN", None), "jean|");
        // Different people, different keys
        assert_ne!(
            customer_key("Jean", Some("0788000111")),
            customer_key("Jean", Some("0788000112"))
        );
    }
}
