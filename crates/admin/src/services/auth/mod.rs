//! Admin authentication service.
//!
//! Password accounts with Argon2id hashes. There is no self sign-up: the
//! first super admin comes from `trattoria-cli admin create`, later ones
//! are added from the admin users page.

mod error;

pub use error::AdminAuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;
use tracing::instrument;

use trattoria_core::{AdminRole, AdminUserId, Email};

use crate::db::{AdminUserRepository, NewAdminUser, RepositoryError};
use crate::models::{AdminUser, CurrentAdmin};

/// Minimum admin password length.
pub const MIN_PASSWORD_LENGTH: usize = 12;

const MAX_NAME_LENGTH: usize = 120;

/// Admin authentication service.
pub struct AdminAuthService<'a> {
    users: AdminUserRepository<'a>,
}

impl<'a> AdminAuthService<'a> {
    /// Create a new admin authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: AdminUserRepository::new(pool),
        }
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::InvalidCredentials` if the email/password is wrong.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AdminUser, AdminAuthError> {
        let email = Email::parse(email).map_err(|_| AdminAuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AdminAuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;
        Ok(user)
    }

    /// Create an admin account.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::InvalidEmail`, `MissingName`, or
    /// `WeakPassword` for bad input, and `UserAlreadyExists` if the email
    /// is taken.
    #[instrument(skip(self, password))]
    pub async fn create_admin(
        &self,
        email: &str,
        name: &str,
        role: AdminRole,
        password: &str,
    ) -> Result<AdminUser, AdminAuthError> {
        let email = Email::parse(email)?;
        let name = name.trim();
        if name.is_empty() || name.chars().count() > MAX_NAME_LENGTH {
            return Err(AdminAuthError::MissingName);
        }
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create(&NewAdminUser {
                email: &email,
                name,
                role,
                password_hash: &password_hash,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AdminAuthError::UserAlreadyExists,
                other => AdminAuthError::Repository(other),
            })?;

        tracing::info!(admin_id = %user.id, role = %user.role, "Admin user created");
        Ok(user)
    }

    /// Delete an admin account on behalf of `actor`.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::CannotDeleteSelf` when `actor` targets their
    /// own account, `LastSuperAdmin` when the target is the only super
    /// admin, and `UserNotFound` if the account does not exist.
    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn delete_admin(
        &self,
        id: AdminUserId,
        actor: &CurrentAdmin,
    ) -> Result<(), AdminAuthError> {
        if id == actor.id {
            return Err(AdminAuthError::CannotDeleteSelf);
        }
        let target = self
            .users
            .get_by_id(id)
            .await?
            .ok_or(AdminAuthError::UserNotFound)?;
        if target.role == AdminRole::SuperAdmin && self.users.count_super_admins().await? <= 1 {
            return Err(AdminAuthError::LastSuperAdmin);
        }

        self.users.delete(id).await.map_err(|e| match e {
            RepositoryError::NotFound => AdminAuthError::UserNotFound,
            other => AdminAuthError::Repository(other),
        })?;

        tracing::info!(admin_id = %id, "Admin user deleted");
        Ok(())
    }
}

/// Validate password meets requirements.
///
/// # Errors
///
/// Returns `AdminAuthError::WeakPassword` if the password is too short.
pub fn validate_password(password: &str) -> Result<(), AdminAuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AdminAuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AdminAuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AdminAuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AdminAuthError::PasswordHash)
}

/// Verify a password against a hash.
///
/// # Errors
///
/// Returns `AdminAuthError::InvalidCredentials` if the password does not
/// match or the stored hash is malformed.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AdminAuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AdminAuthError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AdminAuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("a long admin password").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("a long admin password", &hash).is_ok());
        assert!(matches!(
            verify_password("a wrong admin password", &hash),
            Err(AdminAuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_validate_password_length() {
        assert!(matches!(
            validate_password("elevenchars"),
            Err(AdminAuthError::WeakPassword(_))
        ));
        assert!(validate_password("twelve chars").is_ok());
    }
}
