//! Admin user management commands.
//!
//! Used to create the first `super_admin`; after that, accounts are
//! managed from the admin panel.

use trattoria_admin::services::AdminAuthService;
use trattoria_core::AdminRole;

/// Errors specific to the admin commands.
#[derive(Debug, thiserror::Error)]
pub enum AdminCommandError {
    #[error("Invalid role: {0}. Valid roles: super_admin, admin, viewer")]
    InvalidRole(String),
}

/// Create an admin user with a password.
///
/// # Errors
///
/// Returns an error for an unknown role, an invalid email, a weak password,
/// an existing account, or a database failure.
pub async fn create_user(
    email: &str,
    name: &str,
    role: &str,
    password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let role: AdminRole = role
        .parse()
        .map_err(|_| AdminCommandError::InvalidRole(role.to_owned()))?;
    // Fail on a weak password before opening a connection
    trattoria_admin::services::auth::validate_password(password)?;

    let pool = super::connect().await?;
    let user = AdminAuthService::new(&pool)
        .create_admin(email, name, role, password)
        .await?;

    tracing::info!(
        "Admin user created: ID {}, {} ({})",
        user.id,
        user.email,
        user.role.label()
    );
    Ok(())
}
