//! Access gate: who is making the request and what they may do.

use thiserror::Error;

use canteen_core::Role;

use crate::db::RepositoryError;
use crate::models::{CurrentUser, User};
use crate::store::{Store, UnitOfWork};

/// Reasons a request is not allowed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccessError {
    /// No valid session.
    #[error("authentication required")]
    Unauthenticated,

    /// Signed in, but the role is too low.
    #[error("requires {required} role")]
    Forbidden {
        /// Role the operation needs.
        required: Role,
    },
}

/// Whether `role` grants everything `required` does.
const fn satisfies(role: Role, required: Role) -> bool {
    match required {
        Role::Customer => true,
        Role::Admin => role.is_admin(),
    }
}

/// Check that `user` holds at least `required`.
///
/// # Errors
///
/// Returns `AccessError::Forbidden` when the role is insufficient.
pub const fn require_role(user: &User, required: Role) -> Result<(), AccessError> {
    if satisfies(user.role, required) {
        Ok(())
    } else {
        Err(AccessError::Forbidden { required })
    }
}

/// Resolve the session identity to a live user record.
///
/// Returns `None` if there is no session identity, the user was deleted, or
/// the stored email no longer matches. The returned role is always the one
/// in the database.
///
/// # Errors
///
/// Returns `RepositoryError` if the lookup fails.
pub async fn current_user<S: Store>(
    store: &S,
    session_user: Option<&CurrentUser>,
) -> Result<Option<User>, RepositoryError> {
    let Some(identity) = session_user else {
        return Ok(None);
    };

    let mut uow = store.begin().await?;
    let user = uow.user_by_id(identity.id).await?;
    uow.commit().await?;

    Ok(user.filter(|u| u.email == identity.email))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use canteen_core::{Email, UserId};
    use chrono::Utc;

    use super::*;
    use crate::models::{NewUser, Profile};
    use crate::store::MemoryStore;

    fn user(role: Role) -> User {
        User {
            id: UserId::new(1),
            email: Email::parse("u@canteen.test").unwrap(),
            profile: Profile::new("U", "Ser", "1", "x").unwrap(),
            role,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_customer_cannot_act_as_admin() {
        assert_eq!(
            require_role(&user(Role::Customer), Role::Admin),
            Err(AccessError::Forbidden {
                required: Role::Admin
            })
        );
    }

    #[test]
    fn test_admin_passes_every_check() {
        assert!(require_role(&user(Role::Admin), Role::Admin).is_ok());
        assert!(require_role(&user(Role::Admin), Role::Customer).is_ok());
    }

    #[tokio::test]
    async fn test_role_comes_from_store() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        let email = Email::parse("boss@canteen.test").unwrap();
        let created = uow
            .insert_user(&NewUser {
                email: email.clone(),
                password_hash: "x".to_owned(),
                profile: Profile::new("B", "Oss", "1", "x").unwrap(),
            })
            .await
            .unwrap();
        uow.set_role(&email, Role::Admin).await.unwrap();
        uow.commit().await.unwrap();

        let identity = CurrentUser {
            id: created.id,
            email,
        };
        let resolved = current_user(&store, Some(&identity)).await.unwrap().unwrap();
        assert_eq!(resolved.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_stale_identity_resolves_to_none() {
        let store = MemoryStore::new();
        let identity = CurrentUser {
            id: UserId::new(42),
            email: Email::parse("ghost@canteen.test").unwrap(),
        };
        assert!(current_user(&store, Some(&identity)).await.unwrap().is_none());
        assert!(current_user(&store, None).await.unwrap().is_none());
    }
}
