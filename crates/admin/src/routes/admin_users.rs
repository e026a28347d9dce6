//! Admin users management route handlers (`super_admin` only).

use askama::Template;
use axum::{
    Form,
    extract::{Path, State},
    response::{Html, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use trattoria_core::{AdminRole, AdminUserId};

use crate::{
    db::AdminUserRepository,
    error::AppError,
    filters,
    middleware::{Flash, auth::RequireSuperAdmin},
    models::AdminUser,
    services::{AdminAuthError, AdminAuthService},
    state::AppState,
};

use super::dashboard::AdminUserView;
use super::{page_flash, redirect_with, render};

/// New admin form data.
#[derive(Debug, Deserialize)]
pub struct CreateAdminForm {
    pub email: String,
    pub name: String,
    pub role: String,
    pub password: String,
}

/// Admin users page template.
#[derive(Template)]
#[template(path = "admin_users/index.html")]
pub struct AdminUsersIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub users: Vec<AdminUser>,
    pub current_admin_id: AdminUserId,
    pub roles: [AdminRole; 3],
}

/// Admin users list page handler.
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireSuperAdmin(admin): RequireSuperAdmin,
    State(state): State<AppState>,
    session: Session,
) -> Html<String> {
    let users = AdminUserRepository::new(state.pool())
        .list_all()
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to fetch admin users: {e}");
            vec![]
        });

    render(&AdminUsersIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/admin-users".to_string(),
        flash: page_flash(&session).await,
        users,
        current_admin_id: admin.id,
        roles: AdminRole::ALL,
    })
}

/// Whether an account error is the submitter's to fix.
const fn is_user_error(err: &AdminAuthError) -> bool {
    !matches!(
        err,
        AdminAuthError::Repository(_) | AdminAuthError::PasswordHash
    )
}

/// Create an admin account.
///
/// # Errors
///
/// Returns `AppError::Auth` if the account store fails. Input problems are
/// reported with a flash message instead.
#[instrument(skip(admin, state, session, form), fields(email = %form.email, role = %form.role))]
pub async fn create(
    RequireSuperAdmin(admin): RequireSuperAdmin,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CreateAdminForm>,
) -> Result<Response, AppError> {
    let Ok(role) = form.role.parse::<AdminRole>() else {
        return redirect_with(&session, "/admin-users", Flash::error("Choose a role")).await;
    };

    match AdminAuthService::new(state.pool())
        .create_admin(&form.email, &form.name, role, &form.password)
        .await
    {
        Ok(user) => {
            tracing::info!(created_by = %admin.email, admin_id = %user.id, "Admin added");
            redirect_with(
                &session,
                "/admin-users",
                Flash::success(format!("{} can now sign in.", user.email)),
            )
            .await
        }
        Err(err) if is_user_error(&err) => {
            redirect_with(&session, "/admin-users", Flash::error(err.to_string())).await
        }
        Err(err) => Err(err.into()),
    }
}

/// Delete an admin account.
///
/// # Errors
///
/// Returns `AppError::Auth` if the account store fails. Refusals such as
/// deleting yourself are reported with a flash message.
#[instrument(skip(admin, state, session))]
pub async fn delete(
    RequireSuperAdmin(admin): RequireSuperAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    match AdminAuthService::new(state.pool())
        .delete_admin(AdminUserId::new(id), &admin)
        .await
    {
        Ok(()) => {
            redirect_with(&session, "/admin-users", Flash::success("Admin removed.")).await
        }
        Err(err) if is_user_error(&err) => {
            redirect_with(&session, "/admin-users", Flash::error(err.to_string())).await
        }
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_user_error() {
        assert!(is_user_error(&AdminAuthError::CannotDeleteSelf));
        assert!(is_user_error(&AdminAuthError::LastSuperAdmin));
        assert!(is_user_error(&AdminAuthError::WeakPassword(
            "too short".to_string()
        )));
        assert!(!is_user_error(&AdminAuthError::PasswordHash));
    }
}
