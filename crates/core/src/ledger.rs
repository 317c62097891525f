//! Reserve/release arithmetic between product stock and cart lines.
//!
//! Units move from a product's stock into a cart line on reserve and back on
//! release; they are never created or destroyed. For every product:
//!
//! ```text
//! stock + sum(cart line quantities) == constant   (across reserve/release)
//! ```
//!
//! These functions only compute the next values. Storage backends must call
//! them while holding an exclusive lock on the product row and write the
//! results in the same transaction.

use serde::Serialize;

use crate::types::{Quantity, Stock};

/// Reasons a ledger movement is refused.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum LedgerError {
    /// More units were requested than are on the shelf.
    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock {
        /// Units requested.
        requested: Quantity,
        /// Units on the shelf at the time of the request.
        available: Stock,
    },
    /// The result does not fit in an `INTEGER` column.
    #[error("quantity overflow")]
    Overflow,
}

/// Take `amount` units from `stock`.
///
/// # Errors
///
/// Returns [`LedgerError::InsufficientStock`] when `amount > stock`. Nothing
/// is taken in that case; there are no partial reservations.
pub const fn reserve(stock: Stock, amount: Quantity) -> Result<Stock, LedgerError> {
    match stock.checked_take(amount) {
        Some(remaining) => Ok(remaining),
        None => Err(LedgerError::InsufficientStock {
            requested: amount,
            available: stock,
        }),
    }
}

/// Return `amount` units to `stock`.
///
/// There is no upper bound besides the column range: stock may exceed any
/// earlier level, e.g. after an admin lowered it while units sat in carts.
///
/// # Errors
///
/// Returns [`LedgerError::Overflow`] if the sum exceeds `i32::MAX`.
pub const fn release(stock: Stock, amount: Quantity) -> Result<Stock, LedgerError> {
    match stock.checked_put(amount) {
        Some(total) => Ok(total),
        None => Err(LedgerError::Overflow),
    }
}

/// Quantity of a cart line after `amount` more units are reserved into it.
///
/// `existing` is the line's current quantity, or `None` when the user has no
/// line for this product yet.
///
/// # Errors
///
/// Returns [`LedgerError::Overflow`] when the merged quantity does not fit.
pub const fn merge_line(existing: Option<Quantity>, amount: Quantity) -> Result<Quantity, LedgerError> {
    match existing {
        None => Ok(amount),
        Some(current) => match current.checked_add(amount) {
            Some(merged) => Ok(merged),
            None => Err(LedgerError::Overflow),
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn stock(n: i32) -> Stock {
        Stock::new(n).unwrap()
    }

    fn qty(n: i32) -> Quantity {
        Quantity::new(n).unwrap()
    }

    #[test]
    fn test_reserve_decrements() {
        assert_eq!(reserve(stock(10), qty(4)), Ok(stock(6)));
    }

    #[test]
    fn test_reserve_more_than_available_is_refused() {
        assert_eq!(
            reserve(stock(2), qty(5)),
            Err(LedgerError::InsufficientStock {
                requested: qty(5),
                available: stock(2),
            })
        );
    }

    #[test]
    fn test_reserve_from_empty_shelf() {
        assert!(matches!(
            reserve(Stock::ZERO, Quantity::ONE),
            Err(LedgerError::InsufficientStock { .. })
        ));
    }

    #[test]
    fn test_release_restores() {
        let after_reserve = reserve(stock(10), qty(7)).unwrap();
        assert_eq!(release(after_reserve, qty(7)), Ok(stock(10)));
    }

    #[test]
    fn test_merge_sums_quantities() {
        let shelf = reserve(stock(10), qty(4)).unwrap();
        let line = merge_line(None, qty(4)).unwrap();
        assert_eq!((shelf, line), (stock(6), qty(4)));

        let shelf = reserve(shelf, qty(3)).unwrap();
        let line = merge_line(Some(line), qty(3)).unwrap();
        assert_eq!((shelf, line), (stock(3), qty(7)));
    }

    #[test]
    fn test_merge_overflow() {
        assert_eq!(
            merge_line(Some(qty(i32::MAX)), Quantity::ONE),
            Err(LedgerError::Overflow)
        );
    }

    #[test]
    fn test_conservation_across_moves() {
        let start = stock(25);
        let shelf = reserve(start, qty(9)).unwrap();
        let line = merge_line(None, qty(9)).unwrap();
        assert_eq!(shelf.get() + line.get(), start.get());

        let back = release(shelf, line).unwrap();
        assert_eq!(back, start);
    }

    #[test]
    fn test_refused_reserve_reports_shelf_level() {
        let err = reserve(stock(1), qty(2)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientStock {
                requested: qty(2),
                available: stock(1),
            }
        );
    }
}
