//! Authentication middleware and extractors.
//!
//! Extractors that read the signed-in customer from the session.
//!
//! The account is looked up again on every request, so a customer disabled
//! by staff loses access at their next page load.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use trattoria_core::Customer;

use crate::db::{CustomerRepository, RepositoryError};
use crate::models::{CurrentCustomer, session_keys};
use crate::state::AppState;

/// Extractor that requires a signed-in customer.
///
/// If the customer is not logged in, returns a redirect to the login page.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(customer): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", customer.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentCustomer);

/// Error returned when authentication is required but the customer is not logged in.
pub enum AuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response telling HTMX to load the login page.
    Unauthorized,
    /// The account could not be checked.
    Unavailable,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => {
                (StatusCode::UNAUTHORIZED, [("hx-redirect", "/auth/login")]).into_response()
            }
            Self::Unavailable => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

/// Whether a session's customer may still use their account.
fn is_active(customer: Option<&Customer>) -> bool {
    customer.is_some_and(|c| !c.disabled)
}

/// Re-check the session's customer against the database.
///
/// Signs the session out and returns `None` when the account was deleted
/// or disabled since login.
async fn active_customer(
    state: &AppState,
    session: &Session,
    current: CurrentCustomer,
) -> Result<Option<CurrentCustomer>, RepositoryError> {
    let customer = CustomerRepository::new(state.pool())
        .get_by_id(current.id)
        .await?;
    if is_active(customer.as_ref()) {
        return Ok(Some(current));
    }

    tracing::info!(customer_id = %current.id, "Signing out disabled customer");
    if let Err(e) = clear_current_customer(session).await {
        tracing::warn!("Failed to clear session customer: {e}");
    }
    Ok(None)
}

impl<S> FromRequestParts<S> for RequireAuth
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let login = if parts.headers.contains_key("hx-request") {
            AuthRejection::Unauthorized
        } else {
            AuthRejection::RedirectToLogin
        };

        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        // Get the current customer from the session
        let Some(customer) = session
            .get::<CurrentCustomer>(session_keys::CURRENT_CUSTOMER)
            .await
            .ok()
            .flatten()
        else {
            return Err(login);
        };

        match active_customer(&AppState::from_ref(state), session, customer).await {
            Ok(Some(customer)) => Ok(Self(customer)),
            Ok(None) => Err(login),
            Err(e) => {
                tracing::error!("Failed to check customer account: {e}");
                Err(AuthRejection::Unavailable)
            }
        }
    }
}

/// Extractor that optionally gets the current customer.
///
/// Unlike `RequireAuth`, this does not reject the request if the customer is not logged in.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(
///     OptionalAuth(customer): OptionalAuth,
/// ) -> impl IntoResponse {
///     match customer {
///         Some(c) => format!("Hello, {}!", c.name),
///         None => "Hello, guest!".to_string(),
///     }
/// }
/// ```
pub struct OptionalAuth(pub Option<CurrentCustomer>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<Session>() else {
            return Ok(Self(None));
        };
        let Some(customer) = session
            .get::<CurrentCustomer>(session_keys::CURRENT_CUSTOMER)
            .await
            .ok()
            .flatten()
        else {
            return Ok(Self(None));
        };

        // A failed lookup keeps the login; the handler's own queries will fail too
        let state = AppState::from_ref(state);
        let customer = match active_customer(&state, session, customer.clone()).await {
            Ok(active) => active,
            Err(e) => {
                tracing::warn!("Failed to check customer account: {e}");
                Some(customer)
            }
        };

        Ok(Self(customer))
    }
}

/// Helper to set the current customer in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_customer(
    session: &Session,
    customer: &CurrentCustomer,
) -> Result<(), tower_sessions::session::Error> {
    session
        .insert(session_keys::CURRENT_CUSTOMER, customer)
        .await
}

/// Helper to clear the current customer from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_customer(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentCustomer>(session_keys::CURRENT_CUSTOMER)
        .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use trattoria_core::{CustomerId, Email};

    use super::*;

    fn customer(disabled: bool) -> Customer {
        Customer {
            id: CustomerId::new(3),
            email: Email::parse("marco@example.com").unwrap(),
            name: "Marco".to_string(),
            phone: None,
            address: None,
            disabled,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_disabled_or_deleted_accounts_are_inactive() {
        assert!(is_active(Some(&customer(false))));
        assert!(!is_active(Some(&customer(true))));
        assert!(!is_active(None));
    }

    #[test]
    fn test_rejections() {
        let response = AuthRejection::RedirectToLogin.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/auth/login");

        let response = AuthRejection::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()["hx-redirect"], "/auth/login");

        let response = AuthRejection::Unavailable.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
