//! Decimal money amounts.
//!
//! Amounts are stored as `NUMERIC(10, 2)`: at most ten significant digits,
//! two of them after the decimal point. There is a single store currency,
//! so no currency code is carried.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing [`Money`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The amount is below zero.
    #[error("Ensure this value is greater than or equal to 0.")]
    Negative,
    /// Too many significant digits overall.
    #[error("Ensure that there are no more than {max} digits in total.")]
    TooManyDigits {
        /// Maximum allowed digits.
        max: u32,
    },
    /// Too many digits after the decimal point.
    #[error("Ensure that there are no more than {max} decimal places.")]
    TooManyDecimalPlaces {
        /// Maximum allowed decimal places.
        max: u32,
    },
    /// Too many digits before the decimal point.
    #[error("Ensure that there are no more than {max} digits before the decimal point.")]
    TooManyWholeDigits {
        /// Maximum allowed whole digits.
        max: u32,
    },
}

/// A non-negative amount of money with cent precision.
///
/// Always carries exactly two decimal places, so `19.9` is held (and
/// serialized) as `"19.90"`.
///
/// ```
/// use marketstall_core::Money;
/// use rust_decimal::Decimal;
///
/// let price = Money::new(Decimal::new(199, 1)).unwrap();
/// assert_eq!(price.to_string(), "19.90");
/// assert!(Money::new(Decimal::new(-1, 0)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    /// Maximum number of significant digits.
    pub const MAX_DIGITS: u32 = 10;
    /// Number of digits after the decimal point.
    pub const DECIMAL_PLACES: u32 = 2;

    /// Zero.
    pub const ZERO: Self = Self(Decimal::from_parts(0, 0, 0, false, Self::DECIMAL_PLACES));

    /// Validate a decimal amount and fix it to two decimal places.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is negative or does not fit
    /// `NUMERIC(10, 2)` without rounding.
    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative);
        }

        let normalized = amount.normalize();
        let decimals = normalized.scale();
        let significant = u32::try_from(normalized.mantissa().unsigned_abs().to_string().len())
            .unwrap_or(u32::MAX);
        let total = significant.max(decimals);
        let whole = total - decimals;

        if total > Self::MAX_DIGITS {
            return Err(MoneyError::TooManyDigits {
                max: Self::MAX_DIGITS,
            });
        }
        if decimals > Self::DECIMAL_PLACES {
            return Err(MoneyError::TooManyDecimalPlaces {
                max: Self::DECIMAL_PLACES,
            });
        }
        if whole > Self::MAX_DIGITS - Self::DECIMAL_PLACES {
            return Err(MoneyError::TooManyWholeDigits {
                max: Self::MAX_DIGITS - Self::DECIMAL_PLACES,
            });
        }

        let mut fixed = normalized.abs();
        fixed.rescale(Self::DECIMAL_PLACES);
        Ok(Self(fixed))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units at this unit price.
    ///
    /// # Errors
    ///
    /// Returns an error if the product does not fit `NUMERIC(10, 2)`.
    pub fn times(self, quantity: u32) -> Result<Self, MoneyError> {
        let product = self
            .0
            .checked_mul(Decimal::from(quantity))
            .ok_or(MoneyError::TooManyDigits {
                max: Self::MAX_DIGITS,
            })?;
        Self::new(product)
    }

    /// Sum of two amounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the sum does not fit `NUMERIC(10, 2)`.
    pub fn plus(self, other: Self) -> Result<Self, MoneyError> {
        let sum = self.0.checked_add(other.0).ok_or(MoneyError::TooManyDigits {
            max: Self::MAX_DIGITS,
        })?;
        Self::new(sum)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
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
    use std::str::FromStr;

    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_new_fixes_two_decimal_places() {
        assert_eq!(Money::new(dec("5")).unwrap().to_string(), "5.00");
        assert_eq!(Money::new(dec("19.9")).unwrap().to_string(), "19.90");
        assert_eq!(Money::new(dec("0.050")).unwrap().to_string(), "0.05");
        assert_eq!(Money::ZERO.to_string(), "0.00");
    }

    #[test]
    fn test_new_rejects_negative() {
        assert_eq!(Money::new(dec("-0.01")), Err(MoneyError::Negative));
        assert!(Money::new(dec("-0")).is_ok());
    }

    #[test]
    fn test_new_rejects_excess_precision() {
        assert_eq!(
            Money::new(dec("1.999")),
            Err(MoneyError::TooManyDecimalPlaces { max: 2 })
        );
        assert_eq!(
            Money::new(dec("123456789.55")),
            Err(MoneyError::TooManyDigits { max: 10 })
        );
        assert_eq!(
            Money::new(dec("123456789.5")),
            Err(MoneyError::TooManyWholeDigits { max: 8 })
        );
        assert_eq!(
            Money::new(dec("123456789")),
            Err(MoneyError::TooManyWholeDigits { max: 8 })
        );
        assert!(Money::new(dec("99999999.99")).is_ok());
    }

    #[test]
    fn test_times_and_plus() {
        let unit = Money::new(dec("2.50")).unwrap();
        let line = unit.times(3).unwrap();
        assert_eq!(line.to_string(), "7.50");

        let total = line.plus(Money::new(dec("0.25")).unwrap()).unwrap();
        assert_eq!(total.to_string(), "7.75");

        let big = Money::new(dec("99999999.99")).unwrap();
        assert!(big.times(2).is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let price = Money::new(dec("12.5")).unwrap();
        assert_eq!(serde_json::to_string(&price).unwrap(), "\"12.50\"");

        let from_str: Money = serde_json::from_str("\"3.10\"").unwrap();
        assert_eq!(from_str.to_string(), "3.10");

        let from_number: Money = serde_json::from_str("3.1").unwrap();
        assert_eq!(from_number.to_string(), "3.10");

        assert!(serde_json::from_str::<Money>("\"-4.00\"").is_err());
    }
}
