//! Authentication extractors.
//!
//! The session only names the user. Each extractor reloads the user from the
//! database, so role changes and deletions take effect on the next request.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use canteen_core::Role;

use crate::models::{CurrentUser, User, session_keys};
use crate::services::{current_user, require_role};
use crate::state::AppState;

/// Extractor that requires a signed-in user.
///
/// Anonymous page requests are redirected to the login page; anonymous
/// `/api/` requests get 401.
///
/// # Example
///
/// ```rust,ignore
/// async fn cart_page(RequireUser(user): RequireUser) -> impl IntoResponse {
///     format!("Cart for {}", user.email)
/// }
/// ```
pub struct RequireUser(pub User);

/// Extractor that requires a signed-in administrator.
///
/// Signed-in users without the admin role get 403.
pub struct RequireAdmin(pub User);

/// Extractor that optionally gets the current user.
pub struct OptionalUser(pub Option<User>);

/// Error returned when a request does not pass the access gate.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
    /// Signed in without the required role.
    Forbidden,
    /// The user could not be loaded.
    Internal,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Forbidden => (StatusCode::FORBIDDEN, "Forbidden").into_response(),
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

/// Full request path, including any prefix stripped by `Router::nest`.
fn request_path(parts: &Parts) -> &str {
    parts
        .extensions
        .get::<OriginalUri>()
        .map_or_else(|| parts.uri.path(), |original| original.0.path())
}

/// Load the signed-in user, if any.
async fn load_user(parts: &Parts, state: &AppState) -> Result<Option<User>, AuthRejection> {
    let Some(session) = parts.extensions.get::<Session>() else {
        return Ok(None);
    };

    let identity: Option<CurrentUser> = session
        .get(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten();

    current_user(state.store(), identity.as_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to load session user");
            AuthRejection::Internal
        })
}

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = load_user(parts, state).await?;

        user.map(Self).ok_or_else(|| {
            if request_path(parts).starts_with("/api/") {
                AuthRejection::Unauthorized
            } else {
                AuthRejection::RedirectToLogin
            }
        })
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireUser(user) = RequireUser::from_request_parts(parts, state).await?;

        require_role(&user, Role::Admin).map_err(|_| {
            tracing::warn!(user_id = %user.id, path = %request_path(parts), "Admin access denied");
            AuthRejection::Forbidden
        })?;

        Ok(Self(user))
    }
}

impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(load_user(parts, state).await?))
    }
}

/// Store the signed-in user in the session.
///
/// The session ID is rotated first so an ID issued before login cannot be
/// reused after it.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &User,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session
        .insert(
            session_keys::CURRENT_USER,
            CurrentUser {
                id: user.id,
                email: user.email.clone(),
            },
        )
        .await
}

/// Drop all session data and the session itself (logout).
///
/// # Errors
///
/// Returns an error if the session store cannot be updated.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
