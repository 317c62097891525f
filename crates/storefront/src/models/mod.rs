//! Domain models for the storefront.
//!
//! These types are validated domain objects, separate from the database row
//! types in [`crate::db`].

pub mod cart;
pub mod product;
pub mod session;
pub mod user;

pub use cart::CartLine;
pub use product::{NewProduct, Product, ProductInputError};
pub use session::{CurrentUser, keys as session_keys};
pub use user::{NewUser, Profile, ProfileError, User};
