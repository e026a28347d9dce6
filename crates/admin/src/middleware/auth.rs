//! Authentication and role extractors for admin.
//!
//! Every page except login sits behind [`RequireAdminAuth`]. Handlers that
//! change data take [`RequireWriteAccess`] instead, and account management
//! takes [`RequireSuperAdmin`].

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentAdmin, session_keys};

const LOGIN_PATH: &str = "/auth/login";

/// Extractor that requires admin authentication.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdminAuth(admin): RequireAdminAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", admin.name)
/// }
/// ```
pub struct RequireAdminAuth(pub CurrentAdmin);

/// Extractor that requires a role allowed to change data.
pub struct RequireWriteAccess(pub CurrentAdmin);

/// Extractor that requires the super admin role.
pub struct RequireSuperAdmin(pub CurrentAdmin);

/// Why an admin extractor refused the request.
#[derive(Debug)]
pub enum AdminAuthRejection {
    /// Redirect to login page (for full page loads).
    RedirectToLogin,
    /// Unauthorized response telling HTMX to load the login page.
    Unauthorized,
    /// Signed in, but the role is not enough.
    Forbidden(&'static str),
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::Unauthorized => {
                (StatusCode::UNAUTHORIZED, [("hx-redirect", LOGIN_PATH)]).into_response()
            }
            Self::Forbidden(message) => (StatusCode::FORBIDDEN, message).into_response(),
        }
    }
}

/// Read the signed-in admin from the session.
async fn current_admin(parts: &Parts) -> Result<CurrentAdmin, AdminAuthRejection> {
    let is_fragment = parts.headers.contains_key("hx-request");
    let not_signed_in = || {
        if is_fragment {
            AdminAuthRejection::Unauthorized
        } else {
            AdminAuthRejection::RedirectToLogin
        }
    };

    // Set by SessionManagerLayer
    let session = parts.extensions.get::<Session>().ok_or_else(not_signed_in)?;

    session
        .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await
        .ok()
        .flatten()
        .ok_or_else(not_signed_in)
}

impl<S> FromRequestParts<S> for RequireAdminAuth
where
    S: Send + Sync,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_admin(parts).await.map(Self)
    }
}

impl<S> FromRequestParts<S> for RequireWriteAccess
where
    S: Send + Sync,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin = current_admin(parts).await?;
        if !admin.can_write() {
            return Err(AdminAuthRejection::Forbidden(
                "Your account has read-only access",
            ));
        }
        Ok(Self(admin))
    }
}

impl<S> FromRequestParts<S> for RequireSuperAdmin
where
    S: Send + Sync,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin = current_admin(parts).await?;
        if !admin.is_super_admin() {
            return Err(AdminAuthRejection::Forbidden(
                "Only super admins can access this resource",
            ));
        }
        Ok(Self(admin))
    }
}

/// Extractor that optionally gets the current admin.
pub struct OptionalAdminAuth(pub Option<CurrentAdmin>);

impl<S> FromRequestParts<S> for OptionalAdminAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_admin(parts).await.ok()))
    }
}

/// Helper to set the current admin in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// Helper to clear the current admin from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::http::Request;
    use tower_sessions::MemoryStore;
    use trattoria_core::{AdminRole, AdminUserId, Email};

    use super::*;

    fn admin(role: AdminRole) -> CurrentAdmin {
        CurrentAdmin {
            id: AdminUserId::new(1),
            email: Email::parse("chef@trattoria.test").unwrap(),
            name: "Chef".to_string(),
            role,
        }
    }

    async fn parts_with(admin: Option<CurrentAdmin>, htmx: bool) -> Parts {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        if let Some(admin) = admin {
            set_current_admin(&session, &admin).await.unwrap();
        }
        let mut builder = Request::builder().uri("/products");
        if htmx {
            builder = builder.header("hx-request", "true");
        }
        let (mut parts, ()) = builder.body(()).unwrap().into_parts();
        parts.extensions.insert(session);
        parts
    }

    #[tokio::test]
    async fn test_signed_out_redirects() {
        let mut parts = parts_with(None, false).await;
        let rejection = RequireAdminAuth::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert!(matches!(rejection, AdminAuthRejection::RedirectToLogin));

        let mut parts = parts_with(None, true).await;
        let response = RequireAdminAuth::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap()
            .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()["hx-redirect"], "/auth/login");
    }

    #[tokio::test]
    async fn test_viewer_cannot_write() {
        let mut parts = parts_with(Some(admin(AdminRole::Viewer)), false).await;
        assert!(RequireAdminAuth::from_request_parts(&mut parts, &()).await.is_ok());
        let rejection = RequireWriteAccess::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert!(matches!(rejection, AdminAuthRejection::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_role_checks() {
        let mut parts = parts_with(Some(admin(AdminRole::Admin)), false).await;
        assert!(RequireWriteAccess::from_request_parts(&mut parts, &()).await.is_ok());
        assert!(RequireSuperAdmin::from_request_parts(&mut parts, &()).await.is_err());

        let mut parts = parts_with(Some(admin(AdminRole::SuperAdmin)), false).await;
        let RequireSuperAdmin(current) = RequireSuperAdmin::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(current.role, AdminRole::SuperAdmin);
    }
}
