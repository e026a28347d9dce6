//! Back-office account records.

use chrono::{DateTime, Utc};

use trattoria_core::{AdminUserId, Email};

// Re-export AdminRole from core for convenience
pub use trattoria_core::AdminRole;

/// An admin user. The password hash stays in the repository.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AdminUser {
    /// Unique admin user ID.
    pub id: AdminUserId,
    /// Admin's email address.
    pub email: Email,
    /// Admin's display name.
    pub name: String,
    /// Admin's role/permission level.
    pub role: AdminRole,
    /// When the admin was created.
    pub created_at: DateTime<Utc>,
    /// When the admin was last updated.
    pub updated_at: DateTime<Utc>,
}
