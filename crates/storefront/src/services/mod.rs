//! Business logic services for the storefront.
//!
//! # Services
//!
//! - [`ledger`] - Reserve and release stock under a product row lock
//! - [`cart`] - Add to, remove from and view a user's cart
//! - [`catalog`] - Menu reads and admin product management
//! - [`auth`] - Registration, login and profile updates
//! - [`access`] - Resolve the session user and check roles
//!
//! Each service borrows a [`Store`](crate::store::Store) and runs every
//! operation in its own unit of work.

pub mod access;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod ledger;

pub use access::{AccessError, current_user, require_role};
pub use auth::{AuthError, AuthService, Registration};
pub use cart::{CartError, CartService};
pub use catalog::{CatalogError, CatalogService, InventoryLine};
pub use ledger::InventoryError;
