//! Stock levels and cart quantities.
//!
//! [`Stock`] is the number of units still on the shelf and can be zero.
//! [`Quantity`] is a number of units moving between the shelf and a cart
//! and is always at least one. Both are `i32` to match `INTEGER` columns.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors for out-of-range stock or quantity values.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityError {
    /// A cart quantity must be at least one unit.
    #[error("quantity must be positive (got {0})")]
    NotPositive(i64),
    /// Stock on hand cannot be negative.
    #[error("stock cannot be negative (got {0})")]
    NegativeStock(i64),
    /// The value does not fit in the storage column.
    #[error("value {0} is out of range")]
    OutOfRange(i64),
}

/// A positive number of units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i32")]
pub struct Quantity(i32);

impl Quantity {
    /// One unit.
    pub const ONE: Self = Self(1);

    /// Create a quantity, rejecting zero and negatives.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::NotPositive`] for values below one.
    pub const fn new(value: i32) -> Result<Self, QuantityError> {
        if value < 1 {
            return Err(QuantityError::NotPositive(value as i64));
        }
        Ok(Self(value))
    }

    /// The number of units.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }

    /// Sum of two quantities, or `None` on overflow.
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(sum) => Some(Self(sum)),
            None => None,
        }
    }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        let narrowed = i32::try_from(value).map_err(|_| QuantityError::OutOfRange(value))?;
        Self::new(narrowed)
    }
}

impl TryFrom<i32> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for i32 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Units of a product available for reservation. Never negative.
///
/// Only the ledger moves stock in and out of carts (see
/// [`crate::ledger`]); administrators may overwrite it directly with
/// [`Stock::new`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "i32")]
pub struct Stock(i32);

impl Stock {
    /// Empty shelf.
    pub const ZERO: Self = Self(0);

    /// Create a stock level.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::NegativeStock`] below zero.
    pub const fn new(value: i32) -> Result<Self, QuantityError> {
        if value < 0 {
            return Err(QuantityError::NegativeStock(value as i64));
        }
        Ok(Self(value))
    }

    /// The number of units on hand.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }

    /// Whether `quantity` units can be taken.
    #[must_use]
    pub const fn covers(self, quantity: Quantity) -> bool {
        quantity.0 <= self.0
    }

    /// Stock after taking `quantity` units, or `None` if there are too few.
    #[must_use]
    pub const fn checked_take(self, quantity: Quantity) -> Option<Self> {
        if self.covers(quantity) {
            Some(Self(self.0 - quantity.0))
        } else {
            None
        }
    }

    /// Stock after returning `quantity` units, or `None` on overflow.
    #[must_use]
    pub const fn checked_put(self, quantity: Quantity) -> Option<Self> {
        match self.0.checked_add(quantity.0) {
            Some(sum) => Some(Self(sum)),
            None => None,
        }
    }
}

impl TryFrom<i64> for Stock {
    type Error = QuantityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        let narrowed = i32::try_from(value).map_err(|_| QuantityError::OutOfRange(value))?;
        Self::new(narrowed)
    }
}

impl TryFrom<i32> for Stock {
    type Error = QuantityError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Stock> for i32 {
    fn from(stock: Stock) -> Self {
        stock.0
    }
}

impl fmt::Display for Stock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
