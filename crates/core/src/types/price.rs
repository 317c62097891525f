//! Menu prices using decimal arithmetic.
//!
//! Prices are stored as `NUMERIC(10, 2)` and never as floats, so a cart total
//! is the exact sum of `quantity * price` over its lines.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::stock::Quantity;

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative")]
    Negative,
    /// The amount has more than two decimal places.
    #[error("price must have at most {max} decimal places")]
    TooPrecise {
        /// Maximum allowed scale.
        max: u32,
    },
    /// The amount does not fit the `NUMERIC(10, 2)` column.
    #[error("price cannot exceed {max}")]
    TooLarge {
        /// Largest accepted price.
        max: Decimal,
    },
    /// The input is not a decimal number.
    #[error("price is not a number: {0}")]
    Invalid(String),
}

/// A non-negative unit price with at most two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Maximum number of decimal places.
    pub const MAX_SCALE: u32 = 2;

    /// Largest price a `NUMERIC(10, 2)` column holds.
    pub const MAX: Self = Self(Decimal::from_parts(1_410_065_407, 2, 0, false, 2));

    /// Zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] below zero and
    /// [`PriceError::TooPrecise`] for fractions of a cent.
    /// Returns [`PriceError::TooLarge`] above [`Price::MAX`].
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        if amount > Self::MAX.0 {
            return Err(PriceError::TooLarge { max: Self::MAX.0 });
        }

        let normalized = amount.normalize();
        if normalized.scale() > Self::MAX_SCALE {
            return Err(PriceError::TooPrecise {
                max: Self::MAX_SCALE,
            });
        }

        Ok(Self(normalized))
    }

    /// Create a price from a whole number of cents.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] for negative input.
    pub fn from_cents(cents: i64) -> Result<Self, PriceError> {
        Self::new(Decimal::new(cents, 2))
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units.
    #[must_use]
    pub fn times(&self, quantity: Quantity) -> Decimal {
        self.0 * Decimal::from(quantity.get())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount =
            Decimal::from_str(s.trim()).map_err(|e| PriceError::Invalid(e.to_string()))?;
        Self::new(amount)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price() {
        let price: Price = "4.50".parse().unwrap();
        assert_eq!(price.amount(), Decimal::new(45, 1));
        assert_eq!(price.to_string(), "4.50");
    }

    #[test]
    fn test_zero_is_allowed() {
        assert_eq!("0".parse::<Price>().unwrap(), Price::ZERO);
    }

    #[test]
    fn test_negative_rejected() {
        assert_eq!("-1.00".parse::<Price>(), Err(PriceError::Negative));
    }

    #[test]
    fn test_fraction_of_cent_rejected() {
        assert_eq!(
            "1.005".parse::<Price>(),
            Err(PriceError::TooPrecise { max: 2 })
        );
        // Trailing zeros do not count against the scale.
        assert!("1.5000".parse::<Price>().is_ok());
    }

    #[test]
    fn test_max_matches_column_range() {
        assert_eq!(Price::MAX.amount(), Decimal::new(9_999_999_999, 2));
        assert_eq!("99999999.99".parse::<Price>(), Ok(Price::MAX));
    }

    #[test]
    fn test_above_column_range_rejected() {
        assert_eq!(
            "100000000".parse::<Price>(),
            Err(PriceError::TooLarge {
                max: Price::MAX.amount()
            })
        );
        assert!(matches!(
            Price::from_cents(i64::MAX),
            Err(PriceError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_max_price_times_max_quantity_fits() {
        let total = Price::MAX.times(Quantity::new(i32::MAX).unwrap());
        assert_eq!(total, Price::MAX.amount() * Decimal::from(i32::MAX));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            "three fifty".parse::<Price>(),
            Err(PriceError::Invalid(_))
        ));
    }

    #[test]
    fn test_times_quantity() {
        let price = Price::from_cents(250).unwrap();
        let quantity = Quantity::new(3).unwrap();
        assert_eq!(price.times(quantity), Decimal::new(750, 2));
    }
}
