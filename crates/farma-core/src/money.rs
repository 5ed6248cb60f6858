//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Integer Cents Inside, Decimals On The Wire
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Backend JSON            Boundary                 Inside the client     │
//! │  ────────────            ────────                 ─────────────────     │
//! │                                                                         │
//! │  "Precio_venta": 10.5 ──► Money::from_decimal ──► Money(1050)           │
//! │  "precio": "10,50"    ──► parse_amount        ──► Money(1050)           │
//! │                                                                         │
//! │  Money(1050)          ──► decimal::serialize  ──► "precio_unitario":10.5│
//! │                                                                         │
//! │  Cart totals, change and receipts are pure integer arithmetic.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use farma_core::money::{parse_amount, Money};
//!
//! let price = Money::from_cents(1099); // $10.99
//! let line = price.multiply_quantity(3);
//! assert_eq!(line.cents(), 3297);
//!
//! // Operators type amounts with either decimal separator
//! assert_eq!(parse_amount("20,50"), Some(Money::from_cents(2050)));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in cents.
///
/// Signed so that change can go negative while the operator is still typing
/// the tendered amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// For negative amounts only the major unit carries the sign:
    /// `from_major_minor(-5, 50)` is -$5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Converts a backend decimal into cents, rounding half away from zero.
    ///
    /// Non-finite input (NaN, infinities) becomes zero.
    ///
    /// ## Example
    /// ```rust
    /// use farma_core::money::Money;
    ///
    /// assert_eq!(Money::from_decimal(10.5).cents(), 1050);
    /// assert_eq!(Money::from_decimal(0.1 + 0.2).cents(), 30);
    /// ```
    pub fn from_decimal(value: f64) -> Self {
        if !value.is_finite() {
            return Money::zero();
        }
        Money((value * 100.0).round() as i64)
    }

    /// Converts back to a decimal for JSON request bodies.
    pub fn to_decimal(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.saturating_abs())
    }

    /// Multiplies money by a quantity, saturating at the `i64` bounds.
    ///
    /// ## User Workflow
    /// ```text
    /// Product: Paracetamol 500mg $2.99
    /// Quantity: 3
    ///      │
    ///      ▼
    /// multiply_quantity(3) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// Line subtotal: $8.97
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Formats the amount with two decimals and no currency symbol
    /// (`"10.00"`), the way receipt rows print prices.
    pub fn plain(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, self.dollars().abs(), self.cents_part())
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Parses an operator-typed amount.
///
/// Accepts `,` or `.` as the decimal separator, an optional leading `$`
/// and surrounding whitespace. More than two fraction digits are rounded
/// half up. Returns `None` for anything that is not a plain decimal.
///
/// ## Example
/// ```rust
/// use farma_core::money::{parse_amount, Money};
///
/// assert_eq!(parse_amount("15"), Some(Money::from_cents(1500)));
/// assert_eq!(parse_amount("$ 7.5"), Some(Money::from_cents(750)));
/// assert_eq!(parse_amount("abc"), None);
/// ```
pub fn parse_amount(input: &str) -> Option<Money> {
    let trimmed = input.trim();
    let trimmed = trimmed.strip_prefix('$').unwrap_or(trimmed).trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };

    let normalized = body.replace(',', ".");
    let mut parts = normalized.splitn(2, '.');
    let whole = parts.next().unwrap_or_default();
    let fraction = parts.next().unwrap_or_default();

    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }

    let whole_value: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().ok()?
    };

    let digits: Vec<i64> = fraction
        .chars()
        .filter_map(|c| c.to_digit(10))
        .map(i64::from)
        .collect();
    let mut minor = digits.first().copied().unwrap_or(0) * 10 + digits.get(1).copied().unwrap_or(0);
    if digits.get(2).copied().unwrap_or(0) >= 5 {
        minor += 1;
    }

    let cents = whole_value.checked_mul(100)?.checked_add(minor)?;
    Some(Money(if negative { -cents } else { cents }))
}

// =============================================================================
// Wire Format
// =============================================================================

/// Serde helpers for money fields that travel as JSON decimals.
///
/// ```rust,ignore
/// #[derive(Serialize)]
/// struct Line {
///     #[serde(with = "farma_core::money::decimal")]
///     precio_unitario: Money,
/// }
/// ```
pub mod decimal {
    use super::{parse_amount, Money};
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    pub fn serialize<S>(money: &Money, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(money.to_decimal())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Money, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Money::from_decimal(n)),
            Raw::Text(s) => parse_amount(&s)
                .ok_or_else(|| de::Error::custom(format!("invalid amount: {s}"))),
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
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
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
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
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.dollars(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
        assert_eq!(Money::from_cents(-550).plain(), "-5.50");
    }

    #[test]
    fn test_from_decimal_rounds_to_nearest_cent() {
        assert_eq!(Money::from_decimal(10.0).cents(), 1000);
        assert_eq!(Money::from_decimal(0.125).cents(), 13);
        assert_eq!(Money::from_decimal(f64::NAN).cents(), 0);
        assert_eq!(Money::from_decimal(-1.5).cents(), -150);
    }

    #[test]
    fn test_parse_amount_accepts_comma() {
        assert_eq!(parse_amount("20,50"), Some(Money::from_cents(2050)));
        assert_eq!(parse_amount("20.5"), Some(Money::from_cents(2050)));
        assert_eq!(parse_amount(" 3 "), Some(Money::from_cents(300)));
        assert_eq!(parse_amount(",75"), Some(Money::from_cents(75)));
        assert_eq!(parse_amount("1.005"), Some(Money::from_cents(101)));
        assert_eq!(parse_amount("-2"), Some(Money::from_cents(-200)));
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("."), None);
        assert_eq!(parse_amount("1.2.3"), None);
        assert_eq!(parse_amount("12a"), None);
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_arithmetic_saturates() {
        let huge = Money::from_cents(i64::MAX / 2);

        assert_eq!(huge.multiply_quantity(3).cents(), i64::MAX);
        assert_eq!((huge + huge + huge).cents(), i64::MAX);
        assert_eq!((Money::from_cents(i64::MIN) - huge).cents(), i64::MIN);
        assert_eq!(Money::from_cents(i64::MIN).abs().cents(), i64::MAX);

        let total: Money = vec![huge, huge, huge].into_iter().sum();
        assert_eq!(total.cents(), i64::MAX);
    }

    #[test]
    fn test_decimal_wire_format() {
        #[derive(Serialize, Deserialize)]
        struct Wire {
            #[serde(with = "decimal")]
            amount: Money,
        }

        let json = serde_json::to_string(&Wire {
            amount: Money::from_cents(1550),
        })
        .unwrap();
        assert_eq!(json, r#"{"amount":15.5}"#);

        let from_text: Wire = serde_json::from_str(r#"{"amount":"7,25"}"#).unwrap();
        assert_eq!(from_text.amount.cents(), 725);

        assert!(serde_json::from_str::<Wire>(r#"{"amount":"n/a"}"#).is_err());
    }
}
