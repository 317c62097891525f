//! User domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use canteen_core::{Email, Role, UserId};

/// Maximum length of any profile field.
pub const MAX_PROFILE_FIELD_LENGTH: usize = 100;

/// Errors from profile field validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    /// A required field is blank.
    #[error("{0} is required")]
    Missing(&'static str),
    /// A field exceeds [`MAX_PROFILE_FIELD_LENGTH`].
    #[error("{0} must be at most {MAX_PROFILE_FIELD_LENGTH} characters")]
    TooLong(&'static str),
    /// The phone number contains characters other than digits and `+ -()`.
    #[error("phone number contains invalid characters")]
    InvalidPhone,
}

/// Personal details a user can edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact phone number.
    pub phone: String,
    /// Self-described gender.
    pub gender: String,
}

impl Profile {
    /// Validate and trim profile fields.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError` if a field is blank, too long, or the phone
    /// number has unexpected characters.
    pub fn new(
        first_name: &str,
        last_name: &str,
        phone: &str,
        gender: &str,
    ) -> Result<Self, ProfileError> {
        let first_name = required("first name", first_name)?;
        let last_name = required("last name", last_name)?;
        let phone = required("phone", phone)?;
        let gender = required("gender", gender)?;

        if !phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')' | ' '))
        {
            return Err(ProfileError::InvalidPhone);
        }

        Ok(Self {
            first_name,
            last_name,
            phone,
            gender,
        })
    }

    /// First and last name joined for display.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

fn required(field: &'static str, value: &str) -> Result<String, ProfileError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ProfileError::Missing(field));
    }
    if value.chars().count() > MAX_PROFILE_FIELD_LENGTH {
        return Err(ProfileError::TooLong(field));
    }
    Ok(value.to_owned())
}

/// A registered user (domain type).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login email, unique across users.
    pub email: Email,
    /// Editable personal details.
    pub profile: Profile,
    /// Permission level.
    pub role: Role,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
    /// When the profile or role last changed.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether the user may use the admin panel.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Data for inserting a user. The role always starts as the default.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Login email.
    pub email: Email,
    /// Argon2 PHC string.
    pub password_hash: String,
    /// Personal details.
    pub profile: Profile,
}
