//! Fixed-point currency amounts.
//!
//! Amounts are held as integer cents. On disk they are plain JSON numbers
//! in currency units (`150.0`), which keeps files written by earlier
//! versions readable. Every conversion or division rounds half away from
//! zero to the nearest cent.

use std::fmt;
use std::iter::Sum;
use std::ops::Add;

use schoolfund_core::error::DomainError;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A currency amount in cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    /// Zero.
    pub const ZERO: Money = Money(0);

    /// Largest magnitude accepted from any input: ten trillion units.
    pub const MAX: Money = Money(1_000_000_000_000_000);

    /// [`Money::MAX`] in currency units.
    const MAX_UNITS: f64 = 1e13;

    /// Creates an amount from a number of cents.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Creates an amount from currency units, rounding to the nearest cent.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `units` is not finite or is too
    /// large to be represented.
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_units(units: f64) -> Result<Self, DomainError> {
        if !units.is_finite() || units.abs() > Self::MAX_UNITS {
            return Err(DomainError::Validation(format!(
                "amount {units} is not a representable currency value"
            )));
        }
        // Snap away binary noise (1.005 * 100 = 100.4999...) before rounding.
        let scaled = (units * 100.0 * 10_000.0).round() / 10_000.0;
        Self::checked_from_cents(scaled.round() as i64)
    }

    /// Creates an amount from a number of cents, rejecting magnitudes above
    /// [`Money::MAX`].
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `cents` is out of range.
    pub fn checked_from_cents(cents: i64) -> Result<Self, DomainError> {
        let amount = Self(cents);
        if !amount.is_representable() {
            return Err(DomainError::Validation(format!(
                "amount {amount} is not a representable currency value"
            )));
        }
        Ok(amount)
    }

    /// Returns `true` if the amount is within [`Money::MAX`] in magnitude.
    #[must_use]
    pub const fn is_representable(self) -> bool {
        self.0.unsigned_abs() <= Self::MAX.0.unsigned_abs()
    }

    /// Number of cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Value in currency units.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_units(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Returns `true` for amounts below zero.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Divides the amount into `parts` equal shares, rounded to the cent.
    ///
    /// Returns zero when `parts` is zero.
    #[must_use]
    pub fn split(self, parts: usize) -> Self {
        let Ok(parts) = i64::try_from(parts) else {
            return Self::ZERO;
        };
        if parts == 0 {
            return Self::ZERO;
        }
        let quotient = self.0 / parts;
        let remainder = self.0 % parts;
        if remainder.abs() * 2 >= parts {
            Self(quotient + self.0.signum())
        } else {
            Self(quotient)
        }
    }

    /// Subtracts `rhs`, never going below zero.
    #[must_use]
    pub fn saturating_sub_floor_zero(self, rhs: Self) -> Self {
        Self((self.0 - rhs.0).max(0))
    }

    /// Multiplies the amount by a head count.
    #[must_use]
    pub fn times(self, count: usize) -> Self {
        let count = i64::try_from(count).unwrap_or(i64::MAX);
        Self(self.0.saturating_mul(count))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl std::str::FromStr for Money {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace(',', ".");
        let units: f64 = normalized
            .parse()
            .map_err(|_| DomainError::Validation(format!("'{s}' is not a currency amount")))?;
        Self::from_units(units)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_units())
    }
}

struct MoneyVisitor;

impl Visitor<'_> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a currency amount as a number or numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        let cents = v
            .checked_mul(100)
            .ok_or_else(|| E::custom(format!("amount {v} is not a representable currency value")))?;
        Money::checked_from_cents(cents).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        i64::try_from(v)
            .map_err(|_| E::custom(format!("amount {v} is not a representable currency value")))
            .and_then(|v| self.visit_i64(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        Money::from_units(v).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
        v.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_units_rounds_half_away_from_zero() {
        assert_eq!(Money::from_units(1.005).unwrap(), Money::from_cents(101));
        assert_eq!(Money::from_units(0.125).unwrap(), Money::from_cents(13));
        assert_eq!(Money::from_units(-0.125).unwrap(), Money::from_cents(-13));
        assert_eq!(Money::from_units(450.0).unwrap(), Money::from_cents(45_000));
    }

    #[test]
    fn test_every_input_path_shares_one_bound() {
        // Arrange
        let max_units = Money::MAX.to_units();
        let over = "10000000000000.01";

        // Act
        let from_int: Result<Money, _> = serde_json::from_str("10000000000000");
        let from_float: Result<Money, _> = serde_json::from_str("10000000000000.0");
        let from_text: Result<Money, _> = serde_json::from_str(r#""10000000000000""#);

        // Assert
        assert_eq!(from_int.unwrap(), Money::MAX);
        assert_eq!(from_float.unwrap(), Money::MAX);
        assert_eq!(from_text.unwrap(), Money::MAX);
        assert_eq!(Money::from_units(max_units).unwrap(), Money::MAX);
        assert!(serde_json::from_str::<Money>("10000000000001").is_err());
        assert!(serde_json::from_str::<Money>("20000000000000").is_err());
        assert!(serde_json::from_str::<Money>(over).is_err());
        assert!(over.parse::<Money>().is_err());
        assert!(Money::checked_from_cents(Money::MAX.cents() + 1).is_err());
        assert!(Money::checked_from_cents(i64::MIN).is_err());
    }

    #[test]
    fn test_largest_amount_survives_a_json_round_trip() {
        let json = serde_json::to_string(&Money::MAX).unwrap();

        let back: Money = serde_json::from_str(&json).unwrap();

        assert_eq!(back, Money::MAX);
    }

    #[test]
    fn test_from_units_rejects_non_finite() {
        match Money::from_units(f64::NAN).unwrap_err() {
            DomainError::Validation(msg) => assert!(msg.contains("NaN")),
            other => panic!("expected Validation, got {other:?}"),
        }
        assert!(Money::from_units(f64::INFINITY).is_err());
    }

    #[test]
    fn test_split_rounds_to_nearest_cent() {
        assert_eq!(Money::from_cents(45_000).split(3), Money::from_cents(15_000));
        assert_eq!(Money::from_cents(10_000).split(3), Money::from_cents(3_333));
        assert_eq!(Money::from_cents(20_000).split(3), Money::from_cents(6_667));
        assert_eq!(Money::from_cents(5).split(2), Money::from_cents(3));
        assert_eq!(Money::from_cents(100).split(0), Money::ZERO);
    }

    #[test]
    fn test_saturating_sub_floor_zero_never_goes_negative() {
        let base = Money::from_cents(15_000);
        assert_eq!(
            base.saturating_sub_floor_zero(Money::from_cents(3_000)),
            Money::from_cents(12_000)
        );
        assert_eq!(
            base.saturating_sub_floor_zero(Money::from_cents(20_000)),
            Money::ZERO
        );
    }

    #[test]
    fn test_display_formats_two_decimals() {
        assert_eq!(Money::from_cents(15_000).to_string(), "150.00");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-1_234).to_string(), "-12.34");
    }

    #[test]
    fn test_deserialize_accepts_integers_floats_and_strings() {
        let values: Vec<Money> =
            serde_json::from_str(r#"[100, 99.5, "12,30", " 7.25 "]"#).unwrap();

        assert_eq!(
            values,
            vec![
                Money::from_cents(10_000),
                Money::from_cents(9_950),
                Money::from_cents(1_230),
                Money::from_cents(725),
            ]
        );
    }

    #[test]
    fn test_deserialize_rejects_non_numeric_text() {
        let result: Result<Money, _> = serde_json::from_str(r#""beaucoup""#);

        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_writes_a_json_number() {
        let json = serde_json::to_value(Money::from_cents(12_050)).unwrap();

        assert_eq!(json, serde_json::json!(120.5));
    }
}
