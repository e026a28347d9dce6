//! Unified error handling for admin.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{AdminAuthError, MediaError, OrderError, ProductError};
use crate::validation::ValidationError;

/// Application-level error type for the admin panel.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Admin account operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AdminAuthError),

    /// Order lifecycle change failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Product write failed.
    #[error("Product error: {0}")]
    Product(#[from] ProductError),

    /// Image upload was rejected or could not be stored.
    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    /// Form input was invalid.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The change conflicts with current data.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this error is our fault rather than the client's.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        match self {
            Self::Database(err) => !matches!(
                err,
                RepositoryError::NotFound | RepositoryError::Conflict(_)
            ),
            Self::Session(_) | Self::Internal(_) => true,
            Self::Media(err) | Self::Product(ProductError::Media(err)) => {
                matches!(err, MediaError::Io(_))
            }
            Self::Auth(err) => matches!(
                err,
                AdminAuthError::Repository(_) | AdminAuthError::PasswordHash
            ),
            Self::Order(err) => matches!(err, OrderError::Repository(_)),
            Self::Product(err) => matches!(err, ProductError::Repository(_)),
            Self::Validation(_)
            | Self::NotFound(_)
            | Self::Forbidden(_)
            | Self::Conflict(_)
            | Self::BadRequest(_) => false,
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        if self.is_server_error() {
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
        match self {
            Self::NotFound(_)
            | Self::Database(RepositoryError::NotFound)
            | Self::Order(OrderError::NotFound)
            | Self::Product(ProductError::NotFound)
            | Self::Auth(AdminAuthError::UserNotFound) => StatusCode::NOT_FOUND,
            Self::Conflict(_)
            | Self::Database(RepositoryError::Conflict(_))
            | Self::Order(OrderError::Transition(_) | OrderError::Conflict)
            | Self::Auth(
                AdminAuthError::UserAlreadyExists
                | AdminAuthError::CannotDeleteSelf
                | AdminAuthError::LastSuperAdmin,
            ) => StatusCode::CONFLICT,
            Self::Auth(AdminAuthError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Media(MediaError::TooLarge { .. })
            | Self::Product(ProductError::Media(MediaError::TooLarge { .. })) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            Self::Media(MediaError::UnsupportedType)
            | Self::Product(ProductError::Media(MediaError::UnsupportedType)) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Message safe to show the admin.
    #[must_use]
    pub fn public_message(&self) -> String {
        if self.is_server_error() {
            return "Internal server error".to_string();
        }
        match self {
            Self::Database(RepositoryError::Conflict(msg)) => msg.clone(),
            Self::Auth(err) => err.to_string(),
            Self::Order(err) => err.to_string(),
            Self::Product(err) => err.to_string(),
            Self::Media(err) => err.to_string(),
            Self::Validation(err) => err.to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        (self.status_code(), self.public_message()).into_response()
    }
}

/// Set the Sentry user context from an admin user.
pub fn set_sentry_user(admin_user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(admin_user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use trattoria_core::{OrderStatus, TransitionError};

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("order 123".to_string());
        assert_eq!(err.to_string(), "Not found: order 123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_domain_error_status_codes() {
        assert_eq!(
            get_status(AppError::Order(OrderError::Transition(
                TransitionError::Terminal(OrderStatus::Canceled)
            ))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Order(OrderError::Conflict)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::Conflict(
                "category still has products".to_string()
            ))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Auth(AdminAuthError::LastSuperAdmin)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Media(MediaError::TooLarge { max: 1 })),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            get_status(AppError::Product(ProductError::Media(
                MediaError::UnsupportedType
            ))),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            get_status(AppError::Validation(ValidationError::NameRequired)),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AppError::Database(RepositoryError::Database(sqlx::Error::Protocol(
            "secret".to_string(),
        )));
        assert_eq!(err.public_message(), "Internal server error");

        let err = AppError::Media(MediaError::Io(std::io::Error::other("disk full")));
        assert_eq!(err.public_message(), "Internal server error");

        let err = AppError::Database(RepositoryError::Conflict("name taken".to_string()));
        assert_eq!(err.public_message(), "name taken");
    }
}
