//! User role management commands.
//!
//! Registrations always start as customers; this is the only way to create
//! an administrator.

use canteen_core::{Email, Role};
use canteen_storefront::services::{AuthError, AuthService};
use canteen_storefront::store::PgStore;
use thiserror::Error;

use super::{ConnectError, connect};

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum UserError {
    /// Could not connect.
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// No user has the email.
    #[error("No user registered with email: {0}")]
    NotFound(String),

    /// The update failed.
    #[error("{0}")]
    Auth(#[from] AuthError),
}

/// Set the role of the user with `email`.
///
/// # Errors
///
/// Returns `UserError::NotFound` if nobody registered with the email.
pub async fn set_role(email: &str, role: Role) -> Result<(), UserError> {
    let parsed = Email::parse(email).map_err(|_| UserError::InvalidEmail(email.to_owned()))?;

    let store = PgStore::new(connect().await?);
    let user = AuthService::new(&store)
        .set_role(&parsed, role)
        .await
        .map_err(|e| match e {
            AuthError::UserNotFound => UserError::NotFound(email.to_owned()),
            other => UserError::Auth(other),
        })?;

    tracing::info!("User {} ({}) is now {}", user.email, user.id, user.role);
    Ok(())
}

/// Print all users with their roles.
///
/// # Errors
///
/// Returns an error if the database cannot be read.
pub async fn list() -> Result<(), UserError> {
    let store = PgStore::new(connect().await?);
    let users = AuthService::new(&store).list_users().await?;

    tracing::info!("{} users", users.len());
    for user in users {
        tracing::info!(
            "  {:>5}  {:<8}  {}  ({})",
            user.id,
            user.role,
            user.email,
            user.profile.full_name()
        );
    }
    Ok(())
}
