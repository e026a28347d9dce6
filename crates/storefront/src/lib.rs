//! Trattoria storefront library.
//!
//! The public ordering site: menu, cart, checkout, order tracking, and
//! customer accounts. Exposed as a library so the router can be built from
//! tests and the binary alike.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod views;

use axum::{Router, extract::State, http::StatusCode, routing::get};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::middleware::{RateLimitConfigError, SessionStoreError};
use crate::state::AppState;

/// Directory with CSS and images, relative to the workspace root.
pub const STATIC_DIR: &str = "crates/storefront/static";

/// Errors building the application router.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    RateLimit(#[from] RateLimitConfigError),
    #[error(transparent)]
    Session(#[from] SessionStoreError),
}

/// Build the full storefront application with all middleware.
///
/// # Errors
///
/// Returns `StartupError` if a middleware layer cannot be configured.
pub fn app(state: AppState) -> Result<Router, StartupError> {
    let session_layer = middleware::create_session_layer(state.pool(), state.config())?;
    let media_dir = state.config().media_dir.clone();

    let trace_layer = TraceLayer::new_for_http().make_span_with(|request: &axum::extract::Request| {
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = tracing::field::Empty,
        )
    });

    Ok(Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes()?)
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .nest_service("/media", ServeDir::new(media_dir))
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(session_layer)
        .layer(axum::middleware::from_fn(middleware::csp_nonce_middleware))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(trace_layer)
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction()))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!("Readiness check failed: {e}");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use trattoria_core::PricingRules;

    use super::*;
    use crate::config::{RestaurantInfo, StorefrontConfig};

    const TEST_DATABASE_URL: &str = "postgres://localhost/trattoria_test";

    fn test_state() -> AppState {
        let config = StorefrontConfig {
            database_url: SecretString::from(TEST_DATABASE_URL.to_string()),
            host: [127, 0, 0, 1].into(),
            port: 0,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from("k3J9xQ2mLp8vR4tZ7wY1nB6cF0hD5sG".to_string()),
            media_dir: "./media".into(),
            pricing: PricingRules::default(),
            restaurant: RestaurantInfo::default(),
            sentry_dsn: None,
            sentry_environment: None,
        };
        // Never connects unless a handler touches the database
        let pool = PgPoolOptions::new().connect_lazy(TEST_DATABASE_URL).unwrap();
        AppState::new(config, pool)
    }

    #[tokio::test]
    async fn test_health_responds_with_security_headers() {
        let response = app(test_state())
            .unwrap()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers["x-frame-options"], "DENY");
        assert!(headers.contains_key("x-request-id"));
        let csp = headers["content-security-policy"].to_str().unwrap();
        assert!(csp.contains("'nonce-"));
    }

    #[tokio::test]
    async fn test_upstream_request_id_is_echoed() {
        let response = app(test_state())
            .unwrap()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("x-request-id", "req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()["x-request-id"], "req-42");
    }
}
