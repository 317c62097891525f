//! Core types for Canteen.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod role;
pub mod stock;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceError};
pub use role::{Role, RoleParseError};
pub use stock::{Quantity, QuantityError, Stock};
