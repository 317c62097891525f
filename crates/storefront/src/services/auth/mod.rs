//! Authentication service.
//!
//! Password registration and login with Argon2id, profile updates, and the
//! role changes used by the CLI.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::instrument;

use canteen_core::{Email, Role, UserId};

use crate::db::RepositoryError;
use crate::models::{NewUser, Profile, User};
use crate::store::{Store, UnitOfWork};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length (bounds hashing work).
const MAX_PASSWORD_LENGTH: usize = 256;

/// Raw registration input, as submitted.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    /// Login email.
    pub email: String,
    /// Plaintext password.
    pub password: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact phone number.
    pub phone: String,
    /// Self-described gender.
    pub gender: String,
}

/// Authentication service.
pub struct AuthService<'a, S> {
    store: &'a S,
}

impl<'a, S: Store> AuthService<'a, S> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Register a new customer.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail`, `AuthError::WeakPassword` or
    /// `AuthError::InvalidProfile` for bad input.
    /// Returns `AuthError::DuplicateUser` if the email is already registered.
    #[instrument(skip_all)]
    pub async fn register(&self, input: &Registration) -> Result<User, AuthError> {
        let email = Email::parse(&input.email)?;
        validate_password(&input.password)?;
        let profile = Profile::new(
            &input.first_name,
            &input.last_name,
            &input.phone,
            &input.gender,
        )?;
        let password_hash = hash_password(&input.password)?;

        let mut uow = self.store.begin().await?;
        let user = uow
            .insert_user(&NewUser {
                email,
                password_hash,
                profile,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::DuplicateUser,
                other => AuthError::Repository(other),
            })?;
        uow.commit().await?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[instrument(skip_all)]
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let mut uow = self.store.begin().await?;
        let credentials = uow.user_credentials(&email).await?;
        uow.commit().await?;

        let (user, password_hash) = credentials.ok_or(AuthError::InvalidCredentials)?;
        verify_password(password, &password_hash)?;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(user)
    }

    /// Look up a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if there is no such user.
    pub async fn user(&self, id: UserId) -> Result<User, AuthError> {
        let mut uow = self.store.begin().await?;
        let user = uow.user_by_id(id).await?.ok_or(AuthError::UserNotFound)?;
        uow.commit().await?;
        Ok(user)
    }

    /// Replace a user's profile fields. The email cannot be changed.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user is gone.
    #[instrument(skip_all, fields(user_id = %id))]
    pub async fn update_profile(&self, id: UserId, profile: &Profile) -> Result<User, AuthError> {
        let mut uow = self.store.begin().await?;
        let user = uow
            .update_profile(id, profile)
            .await
            .map_err(not_found_as_missing_user)?;
        uow.commit().await?;
        Ok(user)
    }

    /// All users, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the read fails.
    pub async fn list_users(&self) -> Result<Vec<User>, AuthError> {
        let mut uow = self.store.begin().await?;
        let users = uow.list_users().await?;
        uow.commit().await?;
        Ok(users)
    }

    /// Change a user's role.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if no user has that email.
    #[instrument(skip_all, fields(role = %role))]
    pub async fn set_role(&self, email: &Email, role: Role) -> Result<User, AuthError> {
        let mut uow = self.store.begin().await?;
        let user = uow
            .set_role(email, role)
            .await
            .map_err(not_found_as_missing_user)?;
        uow.commit().await?;

        tracing::info!(user_id = %user.id, "Role changed");
        Ok(user)
    }
}

fn not_found_as_missing_user(e: RepositoryError) -> AuthError {
    match e {
        RepositoryError::NotFound => AuthError::UserNotFound,
        other => AuthError::Repository(other),
    }
}

// =============================================================================
// Password Helpers
// =============================================================================

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if length > MAX_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at most {MAX_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn registration(email: &str) -> Registration {
        Registration {
            email: email.to_owned(),
            password: "correct horse".to_owned(),
            first_name: "Olga".to_owned(),
            last_name: "Petrova".to_owned(),
            phone: "+7 900 000-00-00".to_owned(),
            gender: "female".to_owned(),
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("s3cret-pass").unwrap();
        assert!(verify_password("s3cret-pass", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong-pass", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_short_password_rejected() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
    }

    #[tokio::test]
    async fn test_register_defaults_to_customer() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);

        let user = auth.register(&registration("olga@canteen.test")).await.unwrap();
        assert_eq!(user.role, Role::Customer);
        assert_eq!(user.profile.last_name, "Petrova");
    }

    #[tokio::test]
    async fn test_login_round_trip() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);
        let registered = auth.register(&registration("olga@canteen.test")).await.unwrap();

        let user = auth.login("OLGA@canteen.test", "correct horse").await.unwrap();
        assert_eq!(user.id, registered.id);

        assert!(matches!(
            auth.login("olga@canteen.test", "wrong horse").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("nobody@canteen.test", "correct horse").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_bad_profile_rejected_before_insert() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);
        let mut input = registration("olga@canteen.test");
        input.first_name = "  ".to_owned();

        assert!(matches!(
            auth.register(&input).await,
            Err(AuthError::InvalidProfile(_))
        ));
        assert!(auth.list_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_profile_keeps_email() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);
        let user = auth.register(&registration("olga@canteen.test")).await.unwrap();

        let profile = Profile::new("Olga", "Ivanova", "123", "female").unwrap();
        let updated = auth.update_profile(user.id, &profile).await.unwrap();
        assert_eq!(updated.profile.last_name, "Ivanova");
        assert_eq!(updated.email, user.email);
    }
}
