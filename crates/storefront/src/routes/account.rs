//! Profile route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireUser;
use crate::models::{Profile, User};
use crate::services::AuthService;
use crate::state::AppState;

/// Profile form data. The email is not editable.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub gender: String,
}

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/profile.html")]
pub struct ProfileTemplate {
    pub user: Option<User>,
    pub account: User,
}

/// Profile edit template.
#[derive(Template, WebTemplate)]
#[template(path = "account/profile_edit.html")]
pub struct ProfileEditTemplate {
    pub user: Option<User>,
    pub error: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub gender: String,
}

/// Display the signed-in user's profile.
pub async fn profile(RequireUser(user): RequireUser) -> ProfileTemplate {
    ProfileTemplate {
        user: Some(user.clone()),
        account: user,
    }
}

/// Display the profile form.
pub async fn edit_page(RequireUser(user): RequireUser) -> ProfileEditTemplate {
    let profile = user.profile.clone();
    ProfileEditTemplate {
        user: Some(user),
        error: None,
        first_name: profile.first_name,
        last_name: profile.last_name,
        phone: profile.phone,
        gender: profile.gender,
    }
}

/// Save the profile form.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Form(form): Form<ProfileForm>,
) -> Result<Response> {
    let profile = match Profile::new(&form.first_name, &form.last_name, &form.phone, &form.gender)
    {
        Ok(profile) => profile,
        Err(e) => {
            return Ok(ProfileEditTemplate {
                user: Some(user),
                error: Some(e.to_string()),
                first_name: form.first_name,
                last_name: form.last_name,
                phone: form.phone,
                gender: form.gender,
            }
            .into_response());
        }
    };

    AuthService::new(state.store())
        .update_profile(user.id, &profile)
        .await
        .map_err(AppError::from)?;

    tracing::info!("Profile updated");
    Ok(Redirect::to("/profile").into_response())
}
