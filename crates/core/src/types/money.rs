//! Non-negative money amounts using decimal arithmetic.
//!
//! The store sells in a single currency, so `Money` carries only an amount.
//! Amounts are always rounded to two decimal places and can never be
//! negative: subtraction saturates at zero, which is what price cuts and
//! discounts need.

use core::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors constructing a [`Money`] value.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The amount is below zero.
    #[error("amount cannot be negative")]
    Negative,
    /// The amount could not be parsed.
    #[error("invalid amount: {0}")]
    Invalid(String),
}

/// A non-negative amount with two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::from_parts(0, 0, 0, false, 2));

    /// Create a money value, rounding half away from zero to two places.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Negative` for amounts below zero.
    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative);
        }
        Ok(Self(round(amount)))
    }

    /// Create a money value from whole units (e.g. `Money::from_units(15000)`).
    #[must_use]
    pub fn from_units(units: u32) -> Self {
        Self(round(Decimal::from(units)))
    }

    /// Returns the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Subtract, flooring at zero.
    #[must_use]
    pub fn saturating_sub(self, other: Self) -> Self {
        if other.0 >= self.0 {
            Self::ZERO
        } else {
            Self(self.0 - other.0)
        }
    }

    /// Add two amounts.
    #[must_use]
    pub fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }

    /// The given percentage of this amount, rounded to two places.
    ///
    /// Percentages above 100 are clamped to 100.
    #[must_use]
    pub fn percent(self, percent: u8) -> Self {
        let percent = Decimal::from(percent.min(100));
        Self(round(self.0 * percent / Decimal::ONE_HUNDRED))
    }

    /// Number of whole `unit`s contained in this amount.
    ///
    /// Used for loyalty points: with `unit = 1000`, an amount of 25 999.99
    /// yields 25. A zero unit yields zero.
    #[must_use]
    pub fn whole_units_of(self, unit: u32) -> i32 {
        if unit == 0 {
            return 0;
        }
        (self.0 / Decimal::from(unit))
            .trunc()
            .to_i32()
            .unwrap_or(i32::MAX)
    }
}

fn round(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl std::str::FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = s
            .trim()
            .parse::<Decimal>()
            .map_err(|_| MoneyError::Invalid(s.to_owned()))?;
        Self::new(amount)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Money {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Money {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn money(s: &str) -> Money {
        s.parse().unwrap()
    }

    #[test]
    fn test_rejects_negative() {
        assert_eq!("-1".parse::<Money>(), Err(MoneyError::Negative));
        assert!("-0".parse::<Money>().is_ok());
    }

    #[test]
    fn test_rounds_half_away_from_zero() {
        assert_eq!(money("10.005").to_string(), "10.01");
        assert_eq!(money("10.004").to_string(), "10.00");
    }

    #[test]
    fn test_saturating_sub() {
        assert_eq!(money("10").saturating_sub(money("3.5")), money("6.5"));
        assert_eq!(money("10").saturating_sub(money("12")), Money::ZERO);
    }

    #[test]
    fn test_percent() {
        assert_eq!(money("45000").percent(10), money("4500"));
        assert_eq!(money("9.99").percent(15), money("1.50"));
        assert_eq!(money("20").percent(250), money("20"));
    }

    #[test]
    fn test_whole_units_of() {
        assert_eq!(money("25999.99").whole_units_of(1000), 25);
        assert_eq!(money("999").whole_units_of(1000), 0);
        assert_eq!(money("5000").whole_units_of(0), 0);
    }

    #[test]
    fn test_serde_as_decimal_string() {
        let json = serde_json::to_string(&money("12.5")).unwrap();
        assert_eq!(json, "\"12.50\"");
        let parsed: Money = serde_json::from_str("\"3.10\"").unwrap();
        assert_eq!(parsed, money("3.1"));
        assert!(serde_json::from_str::<Money>("\"-3\"").is_err());
    }
}
