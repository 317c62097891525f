//! Canteen Core - Domain types for the ordering application.
//!
//! This crate provides the types shared by every Canteen component:
//! - `storefront` - Menu, cart and admin web application
//! - `cli` - Command-line tools for migrations, roles and menu seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access. Storage backends lock rows and persist values; the
//! arithmetic that decides whether a reservation is allowed lives here so
//! every backend applies the same rules.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, prices, stock and roles
//! - [`ledger`] - Reserve/release arithmetic between stock and cart lines
//! - [`cart`] - Cart snapshot view-models and totals

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod ledger;
pub mod types;

pub use cart::{CartLineView, CartSnapshot};
pub use ledger::LedgerError;
pub use types::*;
