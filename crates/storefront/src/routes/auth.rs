//! Authentication route handlers.
//!
//! Password login and registration for storefront customers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{clear_current_customer, set_current_customer};
use crate::models::CurrentCustomer;
use crate::services::{AuthError, AuthService, Registration};
use crate::state::AppState;
use crate::views::Layout;

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
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub password: String,
    pub password_confirm: String,
}

/// Query parameters for login redirects.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub registered: Option<bool>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub email: String,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub layout: Layout,
    pub email: String,
    pub name: String,
    pub phone: String,
    pub error: Option<String>,
}

/// Message shown for a failed login. Unknown email and wrong password read
/// the same.
fn login_error_message(err: &AuthError) -> &'static str {
    match err {
        AuthError::AccountDisabled => "This account has been disabled. Please contact us.",
        _ => "Invalid email or password.",
    }
}

/// Message shown for a failed registration.
fn register_error_message(err: &AuthError) -> String {
    match err {
        AuthError::InvalidEmail(_) => "Please enter a valid email address.".to_string(),
        AuthError::UserAlreadyExists => "An account with this email already exists.".to_string(),
        AuthError::WeakPassword(msg) => format!("{msg}."),
        AuthError::MissingName => "Please enter your name.".to_string(),
        _ => "Registration failed. Please try again.".to_string(),
    }
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(layout: Layout, Query(query): Query<LoginQuery>) -> Response {
    if layout.signed_in() {
        return Redirect::to("/account").into_response();
    }
    LoginTemplate {
        layout,
        email: String::new(),
        error: None,
        success: query
            .registered
            .filter(|r| *r)
            .map(|_| "Account created. Please sign in.".to_string()),
    }
    .into_response()
}

/// Handle login form submission.
///
/// # Errors
///
/// Returns `AppError` for session or database failures. Bad credentials
/// re-render the form.
#[instrument(skip(state, session, layout, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    layout: Layout,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    match AuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await
    {
        Ok(customer) => {
            // Rotate the session ID on privilege change
            session.cycle_id().await?;
            set_current_customer(&session, &CurrentCustomer::from(&customer)).await?;
            set_sentry_user(&customer.id, Some(customer.email.as_str()));
            tracing::info!(customer_id = %customer.id, "Customer signed in");
            Ok(Redirect::to("/account").into_response())
        }
        Err(err @ (AuthError::Repository(_) | AuthError::PasswordHash)) => Err(err.into()),
        Err(err) => {
            tracing::warn!(error = %err, "Login failed");
            let page = LoginTemplate {
                layout,
                email: form.email,
                error: Some(login_error_message(&err).to_string()),
                success: None,
            };
            Ok((StatusCode::UNAUTHORIZED, page).into_response())
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(layout: Layout) -> Response {
    if layout.signed_in() {
        return Redirect::to("/account").into_response();
    }
    RegisterTemplate {
        layout,
        email: String::new(),
        name: String::new(),
        phone: String::new(),
        error: None,
    }
    .into_response()
}

/// Handle registration form submission.
///
/// The new customer is signed in straight away.
///
/// # Errors
///
/// Returns `AppError` for session or database failures. Validation
/// problems re-render the form.
#[instrument(skip(state, session, layout, form), fields(email = %form.email))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    layout: Layout,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    let rerender = |layout: Layout, error: String| {
        RegisterTemplate {
            layout,
            email: form.email.clone(),
            name: form.name.clone(),
            phone: form.phone.clone().unwrap_or_default(),
            error: Some(error),
        }
    };

    if form.password != form.password_confirm {
        let page = rerender(layout, "Passwords do not match.".to_string());
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
    }

    let registration = Registration {
        email: &form.email,
        password: &form.password,
        name: &form.name,
        phone: form.phone.as_deref(),
    };

    match AuthService::new(state.pool()).register(&registration).await {
        Ok(customer) => {
            session.cycle_id().await?;
            set_current_customer(&session, &CurrentCustomer::from(&customer)).await?;
            set_sentry_user(&customer.id, Some(customer.email.as_str()));
            Ok(Redirect::to("/account").into_response())
        }
        Err(err @ (AuthError::Repository(_) | AuthError::PasswordHash)) => Err(err.into()),
        Err(err) => {
            tracing::info!(error = %err, "Registration rejected");
            let status = if matches!(err, AuthError::UserAlreadyExists) {
                StatusCode::CONFLICT
            } else {
                StatusCode::UNPROCESSABLE_ENTITY
            };
            let page = rerender(layout, register_error_message(&err));
            Ok((status, page).into_response())
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Sign out. The cart and guest orders are kept with the session.
///
/// # Errors
///
/// Returns `AppError::Session` if the session cannot be modified.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect, AppError> {
    clear_current_customer(&session).await?;
    session.cycle_id().await?;
    clear_sentry_user();
    Ok(Redirect::to("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_errors_do_not_reveal_accounts() {
        assert_eq!(
            login_error_message(&AuthError::InvalidCredentials),
            "Invalid email or password."
        );
        assert!(login_error_message(&AuthError::AccountDisabled).contains("disabled"));
    }

    #[test]
    fn test_register_error_messages() {
        assert_eq!(
            register_error_message(&AuthError::WeakPassword(
                "Password must be at least 8 characters".to_string()
            )),
            "Password must be at least 8 characters."
        );
        assert_eq!(
            register_error_message(&AuthError::MissingName),
            "Please enter your name."
        );
    }
}
