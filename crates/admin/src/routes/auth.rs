//! Authentication route handlers for admin.
//!
//! Email and password login. Accounts are created by a super admin or
//! with `trattoria-cli admin create`.

use askama::Template;
use axum::{
    Form, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAdminAuth, clear_current_admin, set_current_admin};
use crate::models::CurrentAdmin;
use crate::services::{AdminAuthError, AdminAuthService};
use crate::state::AppState;

use super::render;

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Login page template.
#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub email: String,
    pub error: Option<String>,
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", get(login_page).post(login))
        .route("/auth/logout", axum::routing::post(logout))
}

/// Render the login page.
///
/// GET /auth/login
async fn login_page(OptionalAdminAuth(admin): OptionalAdminAuth) -> Response {
    if admin.is_some() {
        return Redirect::to("/").into_response();
    }
    render(&LoginTemplate {
        email: String::new(),
        error: None,
    })
    .into_response()
}

/// Handle the login form.
///
/// POST /auth/login
#[instrument(skip(state, session, form), fields(email = %form.email))]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    match AdminAuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await
    {
        Ok(user) => {
            // Rotate the session ID on privilege change
            session.cycle_id().await?;
            set_current_admin(&session, &CurrentAdmin::from(&user)).await?;
            set_sentry_user(&user.id, Some(user.email.as_str()));
            tracing::info!(admin_id = %user.id, "Admin signed in");
            Ok(Redirect::to("/").into_response())
        }
        Err(err @ (AdminAuthError::Repository(_) | AdminAuthError::PasswordHash)) => {
            Err(err.into())
        }
        Err(err) => {
            tracing::warn!(error = %err, "Admin login failed");
            let page = render(&LoginTemplate {
                email: form.email,
                error: Some("Invalid email or password.".to_string()),
            });
            Ok((StatusCode::UNAUTHORIZED, page).into_response())
        }
    }
}

/// Logout and clear session.
///
/// POST /auth/logout
async fn logout(session: Session) -> impl IntoResponse {
    if let Err(e) = clear_current_admin(&session).await {
        tracing::warn!("Failed to clear admin session: {e}");
    }
    if let Err(e) = session.flush().await {
        tracing::warn!("Failed to flush admin session: {e}");
    }
    clear_sentry_user();
    Redirect::to("/auth/login")
}
