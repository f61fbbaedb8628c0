//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! In floating point:
//!   0.1 + 0.2 = 0.30000000000000004   WRONG!
//!
//! Our solution: integer francs.
//! The Rwandan franc has no minor unit in circulation, so every amount in
//! the system is a whole number of francs (i64). The database, the
//! calculations, and the API all use the same integer representation.
//! ```
//!
//! ## Usage
//! ```rust
//! use register_core::money::Money;
//!
//! let amount = Money::from_amount(100_000); // 100,000 RWF
//!
//! // Insurance split: 80% covered, 20% patient part
//! let (covered, patient) = amount.split_percentage(80);
//! assert_eq!(covered.amount(), 80_000);
//! assert_eq!(patient.amount(), 20_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in whole francs.
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for returns and differences
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Integer equality**: The "balanced within 0.01" check of a float-based
///   register collapses to exact equality with zero here
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from a whole-franc amount.
    #[inline]
    pub const fn from_amount(amount: i64) -> Self {
        Money(amount)
    }

    /// Returns the value in whole francs.
    #[inline]
    pub const fn amount(&self) -> i64 {
        self.0
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Splits the amount by a percentage, returning `(covered, remainder)`.
    ///
    /// ## Rounding
    /// The covered portion is `round(amount × percent / 100)` with
    /// round-half-up integer math; the remainder is whatever is left, so the
    /// two parts always sum back to the original amount. No franc is ever
    /// created or lost by the split.
    ///
    /// ## Example
    /// ```rust
    /// use register_core::money::Money;
    ///
    /// let sale = Money::from_amount(100_000);
    /// let (insurer, patient) = sale.split_percentage(80);
    /// assert_eq!(insurer.amount(), 80_000);
    /// assert_eq!(patient.amount(), 20_000);
    /// assert_eq!(insurer + patient, sale);
    /// ```
    pub fn split_percentage(&self, percent: u8) -> (Money, Money) {
        // i128 prevents overflow on large amounts
        let covered = ((self.0 as i128 * percent as i128 + 50) / 100) as i64;
        (Money(covered), Money(self.0 - covered))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows the amount with thousands grouping.
///
/// ## Note
/// This is for logs and receipts. Presentation layers handle localization.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{} RWF", sign, group_thousands(self.0.abs()))
    }
}

/// Formats a non-negative integer with `,` thousands separators.
fn group_thousands(mut n: i64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut groups = Vec::new();
    while n > 0 {
        groups.push((n % 1000) as u16);
        n /= 1000;
    }
    let mut out = groups.pop().map(|g| g.to_string()).unwrap_or_default();
    while let Some(g) = groups.pop() {
        out.push_str(&format!(",{:03}", g));
    }
    out
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Negation, used when building return reversals.
impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_amount() {
        let money = Money::from_amount(100_000);
        assert_eq!(money.amount(), 100_000);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_amount(100_000)), "100,000 RWF");
        assert_eq!(format!("{}", Money::from_amount(1_234_567)), "1,234,567 RWF");
        assert_eq!(format!("{}", Money::from_amount(500)), "500 RWF");
        assert_eq!(format!("{}", Money::from_amount(-2_500)), "-2,500 RWF");
        assert_eq!(format!("{}", Money::zero()), "0 RWF");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_amount(1_000);
        let b = Money::from_amount(400);

        assert_eq!((a + b).amount(), 1_400);
        assert_eq!((a - b).amount(), 600);
        assert_eq!((-a).amount(), -1_000);
        assert_eq!(a.abs(), a);
        assert_eq!((-a).abs(), a);
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 200, 300].iter().map(|&a| Money::from_amount(a)).sum();
        assert_eq!(total.amount(), 600);
    }

    #[test]
    fn test_split_percentage_exact() {
        let sale = Money::from_amount(100_000);
        let (covered, patient) = sale.split_percentage(80);
        assert_eq!(covered.amount(), 80_000);
        assert_eq!(patient.amount(), 20_000);
    }

    #[test]
    fn test_split_percentage_rounds_half_up() {
        // 85% of 999 = 849.15 -> 849; remainder keeps the lost franc
        let (covered, patient) = Money::from_amount(999).split_percentage(85);
        assert_eq!(covered.amount(), 849);
        assert_eq!(patient.amount(), 150);

        // 50% of 101 = 50.5 -> 51 (half rounds up)
        let (covered, patient) = Money::from_amount(101).split_percentage(50);
        assert_eq!(covered.amount(), 51);
        assert_eq!(patient.amount(), 50);
    }

    #[test]
    fn test_split_percentage_sums_back() {
        for amount in [1, 7, 99, 1_000, 12_345, 1_000_000] {
            for pct in [0u8, 1, 10, 33, 50, 80, 99, 100] {
                let m = Money::from_amount(amount);
                let (covered, rest) = m.split_percentage(pct);
                assert_eq!(covered + rest, m, "amount={amount} pct={pct}");
            }
        }
    }

    #[test]
    fn test_split_percentage_bounds() {
        let m = Money::from_amount(5_000);
        assert_eq!(m.split_percentage(0), (Money::zero(), m));
        assert_eq!(m.split_percentage(100), (m, Money::zero()));
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        assert!(Money::from_amount(100).is_positive());
        assert!(Money::from_amount(-100).is_negative());
    }
}
