//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{AccessError, AuthError, CartError, CatalogError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Catalog operation failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Caller is not signed in or lacks the role.
    #[error("Access denied: {0}")]
    Access(#[from] AccessError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this error is our fault rather than the client's.
    fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(_)
                | Self::Internal(_)
                | Self::Cart(CartError::Repository(_))
                | Self::Catalog(CatalogError::Repository(_))
                | Self::Auth(AuthError::Repository(_) | AuthError::PasswordHash)
        )
    }

    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        if self.is_server_error() {
            return StatusCode::INTERNAL_SERVER_ERROR;
        }

        match self {
            Self::Cart(err) => match err {
                CartError::InsufficientStock { .. } => StatusCode::CONFLICT,
                CartError::ProductNotFound(_) | CartError::LineNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                CartError::QuantityOverflow => StatusCode::BAD_REQUEST,
                CartError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Catalog(CatalogError::Rejected(_)) => StatusCode::BAD_REQUEST,
            Self::Catalog(_) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::UserNotFound => StatusCode::NOT_FOUND,
                AuthError::DuplicateUser => StatusCode::CONFLICT,
                AuthError::WeakPassword(_)
                | AuthError::InvalidEmail(_)
                | AuthError::InvalidProfile(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Access(AccessError::Unauthenticated) => StatusCode::UNAUTHORIZED,
            Self::Access(AccessError::Forbidden { .. }) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the client.
    #[must_use]
    pub fn public_message(&self) -> String {
        if self.is_server_error() {
            return "Internal server error".to_string();
        }

        match self {
            Self::Cart(err) => err.to_string(),
            Self::Catalog(err) => err.to_string(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid credentials".to_string(),
                AuthError::DuplicateUser => {
                    "An account with this email already exists".to_string()
                }
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                AuthError::InvalidProfile(e) => e.to_string(),
                AuthError::UserNotFound => "User not found".to_string(),
                _ => "Authentication error".to_string(),
            },
            Self::Access(AccessError::Unauthenticated) => "Please log in".to_string(),
            Self::Access(AccessError::Forbidden { .. }) => "Forbidden".to_string(),
            _ => self.to_string(),
        }
    }

    /// Capture server errors to Sentry and log them. Client errors are
    /// ignored.
    pub fn report(&self) {
        if self.is_server_error() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.report();
        (self.status(), self.public_message()).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "12")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use canteen_core::{CartLineId, Quantity, Role, Stock};

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_cart_error_status_codes() {
        assert_eq!(
            get_status(AppError::Cart(CartError::InsufficientStock {
                requested: Quantity::new(5).unwrap(),
                available: Stock::new(2).unwrap(),
            })),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Cart(CartError::LineNotFound(CartLineId::new(3)))),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_access_error_status_codes() {
        assert_eq!(
            get_status(AppError::Access(AccessError::Unauthenticated)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Access(AccessError::Forbidden {
                required: Role::Admin
            })),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_rejected_product_is_bad_request() {
        let err = AppError::Catalog(CatalogError::Rejected("price out of range".to_string()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "product rejected: price out of range");
    }

    #[test]
    fn test_duplicate_user_is_conflict() {
        assert_eq!(
            get_status(AppError::Auth(AuthError::DuplicateUser)),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_database_errors_hide_details() {
        let err = AppError::Cart(CartError::Repository(RepositoryError::DataCorruption(
            "secret detail".to_string(),
        )));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Internal server error");
    }
}
