//! # Money Module
//!
//! Provides the `Money` type for salary and payroll amounts.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  With floating point salaries:                                          │
//! │    basic 500.10 + hra 100.20 = 600.3000000000001  ❌                    │
//! │    net = gross - deductions drifts a paisa per record                   │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units                                      │
//! │    50010 + 10020 = 60030 exactly                                        │
//! │    gross, total deductions and net pay are exact sums                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use hrms_core::money::{Money, Rate};
//!
//! let basic = Money::from_minor(50_000);
//! let hra = basic.apply_rate(Rate::from_bps(2_000)); // 20% of basic
//! assert_eq!(hra.minor(), 10_000);
//! assert_eq!((basic + hra).minor(), 60_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Where Money is Used
/// ```text
/// Employee.salary_monthly ──► Payroll.basic ──┐
///                                            ├──► gross_pay ──► net_pay
/// CompensationTable (HRA, allowances) ───────┘         ▲
///                                                      │
/// CompensationTable (deductions) ──► total_deductions ─┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[serde(transparent)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ```rust
    /// use hrms_core::money::Money;
    ///
    /// let salary = Money::from_minor(5_000_000);
    /// assert_eq!(salary.minor(), 5_000_000);
    /// ```
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Creates a Money value from whole major units.
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major * 100)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns the whole major-unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor-unit portion (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Applies a basis-point rate, rounding half away from zero.
    ///
    /// ## Implementation
    /// Integer math in i128: `(amount * bps ± 5000) / 10000`, saturating at
    /// the `i64` bounds. A saturated amount fails the checked sums in
    /// `compute_totals` rather than wrapping.
    ///
    /// ```rust
    /// use hrms_core::money::{Money, Rate};
    ///
    /// let basic = Money::from_minor(1_005);
    /// // 1005 × 12.5% = 125.625 → 126
    /// assert_eq!(basic.apply_rate(Rate::from_bps(1_250)).minor(), 126);
    /// ```
    pub fn apply_rate(&self, rate: Rate) -> Money {
        let product = self.0 as i128 * rate.bps() as i128;
        let rounded = if product < 0 {
            (product - 5_000) / 10_000
        } else {
            (product + 5_000) / 10_000
        };
        let saturated = if rounded < 0 { i64::MIN } else { i64::MAX };
        Money(i64::try_from(rounded).unwrap_or(saturated))
    }

    /// Addition that returns `None` on overflow.
    #[inline]
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Subtraction that returns `None` on overflow.
    #[inline]
    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
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

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Rate
// =============================================================================

/// A percentage expressed in basis points.
///
/// 1 basis point = 0.01%, so 2000 bps = 20% (the default HRA share of basic).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct Rate(u32);

impl Rate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }
}

impl Default for Rate {
    fn default() -> Self {
        Rate::zero()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_minor_and_parts() {
        let money = Money::from_minor(1099);
        assert_eq!(money.minor(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor_part(), 99);
        assert_eq!(Money::from_major(12).minor(), 1200);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_minor(1099).to_string(), "10.99");
        assert_eq!(Money::from_minor(500).to_string(), "5.00");
        assert_eq!(Money::from_minor(-550).to_string(), "-5.50");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_minor(1000);
        let b = Money::from_minor(500);
        assert_eq!((a + b).minor(), 1500);
        assert_eq!((a - b).minor(), 500);

        let mut c = a;
        c += b;
        c -= Money::from_minor(200);
        assert_eq!(c.minor(), 1300);
    }

    #[test]
    fn test_sum() {
        let amounts = [
            Money::from_minor(2000),
            Money::from_minor(1500),
            Money::from_minor(500),
        ];
        let by_ref: Money = amounts.iter().sum();
        let by_value: Money = amounts.into_iter().sum();
        assert_eq!(by_ref.minor(), 4000);
        assert_eq!(by_value, by_ref);

        let empty: Money = Vec::<Money>::new().into_iter().sum();
        assert!(empty.is_zero());
    }

    #[test]
    fn test_apply_rate_rounds_half_up() {
        let basic = Money::from_minor(50_000);
        assert_eq!(basic.apply_rate(Rate::from_bps(2_000)).minor(), 10_000);

        // 333 × 50% = 166.5 → 167
        assert_eq!(Money::from_minor(333).apply_rate(Rate::from_bps(5_000)).minor(), 167);

        // Negative amounts round away from zero symmetrically
        assert_eq!(Money::from_minor(-333).apply_rate(Rate::from_bps(5_000)).minor(), -167);
    }

    #[test]
    fn test_checked_arithmetic() {
        let max = Money::from_minor(i64::MAX);
        assert_eq!(max.checked_add(Money::from_minor(1)), None);
        assert_eq!(Money::from_minor(i64::MIN).checked_sub(Money::from_minor(1)), None);
        assert_eq!(
            Money::from_minor(700).checked_sub(Money::from_minor(900)),
            Some(Money::from_minor(-200))
        );
    }

    #[test]
    fn test_apply_rate_saturates() {
        let huge = Money::from_minor(i64::MAX);
        assert_eq!(huge.apply_rate(Rate::from_bps(50_000)).minor(), i64::MAX);
        assert_eq!(Money::from_minor(i64::MIN).apply_rate(Rate::from_bps(50_000)).minor(), i64::MIN);
    }

    #[test]
    fn test_apply_zero_rate() {
        let basic = Money::from_minor(123_456);
        assert!(basic.apply_rate(Rate::zero()).is_zero());
    }

    #[test]
    fn test_serde_is_plain_integer() {
        let json = serde_json::to_string(&Money::from_minor(62_000)).unwrap();
        assert_eq!(json, "62000");
        let back: Money = serde_json::from_str("57000").unwrap();
        assert_eq!(back.minor(), 57_000);

        let rate: Rate = serde_json::from_str("2000").unwrap();
        assert_eq!(rate.bps(), 2000);
    }
}
