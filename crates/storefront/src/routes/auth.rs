//! Authentication route handlers.
//!
//! Handles login, registration and logout against the local users table.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalUser, clear_current_user, set_current_user};
use crate::models::User;
use crate::services::{AuthError, AuthService, Registration};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub gender: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub user: Option<User>,
    pub error: Option<String>,
    pub email: String,
}

/// Register page template.
///
/// Submitted values are echoed back on error; passwords never are.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub user: Option<User>,
    pub error: Option<String>,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub gender: String,
}

impl RegisterTemplate {
    fn with_error(form: RegisterForm, error: String) -> Self {
        Self {
            user: None,
            error: Some(error),
            email: form.email,
            first_name: form.first_name,
            last_name: form.last_name,
            phone: form.phone,
            gender: form.gender,
        }
    }
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(OptionalUser(user): OptionalUser) -> Response {
    if user.is_some() {
        return Redirect::to("/menu").into_response();
    }

    LoginTemplate {
        user: None,
        error: None,
        email: String::new(),
    }
    .into_response()
}

/// Handle login form submission.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    match AuthService::new(state.store())
        .login(&form.email, &form.password)
        .await
    {
        Ok(user) => {
            set_current_user(&session, &user).await.map_err(|e| {
                AppError::Internal(format!("failed to store session: {e}"))
            })?;
            set_sentry_user(&user.id, Some(user.email.as_str()));
            Ok(Redirect::to("/menu").into_response())
        }
        Err(AuthError::InvalidCredentials) => {
            tracing::warn!("Login failed");
            Ok(LoginTemplate {
                user: None,
                error: Some("Invalid email or password.".to_string()),
                email: form.email,
            }
            .into_response())
        }
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(OptionalUser(user): OptionalUser) -> Response {
    if user.is_some() {
        return Redirect::to("/menu").into_response();
    }

    RegisterTemplate {
        user: None,
        error: None,
        email: String::new(),
        first_name: String::new(),
        last_name: String::new(),
        phone: String::new(),
        gender: String::new(),
    }
    .into_response()
}

/// Handle registration form submission.
///
/// New accounts are signed in immediately.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    if form.password != form.password_confirm {
        return Ok(
            RegisterTemplate::with_error(form, "Passwords do not match.".to_string())
                .into_response(),
        );
    }

    let registration = Registration {
        email: form.email.clone(),
        password: form.password.clone(),
        first_name: form.first_name.clone(),
        last_name: form.last_name.clone(),
        phone: form.phone.clone(),
        gender: form.gender.clone(),
    };

    match AuthService::new(state.store()).register(&registration).await {
        Ok(user) => {
            set_current_user(&session, &user).await.map_err(|e| {
                AppError::Internal(format!("failed to store session: {e}"))
            })?;
            set_sentry_user(&user.id, Some(user.email.as_str()));
            Ok(Redirect::to("/menu").into_response())
        }
        Err(
            e @ (AuthError::DuplicateUser
            | AuthError::InvalidEmail(_)
            | AuthError::WeakPassword(_)
            | AuthError::InvalidProfile(_)),
        ) => {
            let message = AppError::from(e).public_message();
            Ok(RegisterTemplate::with_error(form, message).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
pub async fn logout(session: Session) -> Result<Redirect, AppError> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("failed to clear session: {e}")))?;
    clear_sentry_user();
    Ok(Redirect::to("/"))
}
