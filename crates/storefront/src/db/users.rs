//! User repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use canteen_core::{Email, Role, UserId};

use super::{RepositoryError, map_write_error};
use crate::models::{NewUser, Profile, User};

/// Row shape shared by every user query.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: i32,
    email: String,
    first_name: String,
    last_name: String,
    phone: String,
    gender: String,
    role: Role,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            email,
            profile: Profile {
                first_name: row.first_name,
                last_name: row.last_name,
                phone: row.phone,
                gender: row.gender,
            },
            role: row.role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

/// Repository for user database operations.
pub struct UserRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> UserRepository<'c> {
    /// Create a new user repository on a connection or open transaction.
    #[must_use]
    pub const fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    /// Insert a user with the default role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&mut self, user: &NewUser) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO users (email, password_hash, first_name, last_name, phone, gender)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, email, first_name, last_name, phone, gender, role,
                      created_at, updated_at
            ",
        )
        .bind(user.email.as_str())
        .bind(&user.password_hash)
        .bind(&user.profile.first_name)
        .bind(&user.profile.last_name)
        .bind(&user.profile.phone)
        .bind(&user.profile.gender)
        .fetch_one(&mut *self.conn)
        .await
        .map_err(|e| map_write_error(e, "email already exists"))?;

        row.try_into()
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_id(&mut self, id: UserId) -> Result<Option<User>, RepositoryError> {
        sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, email, first_name, last_name, phone, gender, role,
                   created_at, updated_at
            FROM users
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?
        .map(User::try_from)
        .transpose()
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&mut self, email: &Email) -> Result<Option<User>, RepositoryError> {
        sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, email, first_name, last_name, phone, gender, role,
                   created_at, updated_at
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(&mut *self.conn)
        .await?
        .map(User::try_from)
        .transpose()
    }

    /// Get a user together with their password hash, for login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &mut self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r"
            SELECT id, email, first_name, last_name, phone, gender, role,
                   created_at, updated_at, password_hash
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(&mut *self.conn)
        .await?;

        match row {
            Some(r) => Ok(Some((r.user.try_into()?, r.password_hash))),
            None => Ok(None),
        }
    }

    /// Replace a user's profile fields. The email never changes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn update_profile(
        &mut self,
        id: UserId,
        profile: &Profile,
    ) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, UserRow>(
            r"
            UPDATE users
            SET first_name = $2, last_name = $3, phone = $4, gender = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, first_name, last_name, phone, gender, role,
                      created_at, updated_at
            ",
        )
        .bind(id)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.phone)
        .bind(&profile.gender)
        .fetch_optional(&mut *self.conn)
        .await?
        .ok_or(RepositoryError::NotFound)?
        .try_into()
    }

    /// Set the role of the user with `email`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no user has that email.
    pub async fn set_role(&mut self, email: &Email, role: Role) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, UserRow>(
            r"
            UPDATE users
            SET role = $2, updated_at = NOW()
            WHERE email = $1
            RETURNING id, email, first_name, last_name, phone, gender, role,
                      created_at, updated_at
            ",
        )
        .bind(email.as_str())
        .bind(role)
        .fetch_optional(&mut *self.conn)
        .await?
        .ok_or(RepositoryError::NotFound)?
        .try_into()
    }

    /// List all users, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&mut self) -> Result<Vec<User>, RepositoryError> {
        sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, email, first_name, last_name, phone, gender, role,
                   created_at, updated_at
            FROM users
            ORDER BY id
            ",
        )
        .fetch_all(&mut *self.conn)
        .await?
        .into_iter()
        .map(User::try_from)
        .collect()
    }
}
