//! Trattoria admin library.
//!
//! The back-office for staff: menu management, the order queue, customer
//! accounts, and admin users. Exposed as a library so the router can be
//! built from tests and the CLI can reuse the account service.
//!
//! # Security
//!
//! Every page except the login form requires an admin session. Write
//! operations additionally require the `admin` or `super_admin` role.

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
pub mod validation;

use axum::{Router, extract::State, http::StatusCode, routing::get};
use tower_http::{
    services::ServeDir,
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tracing::Span;

use crate::middleware::SessionStoreError;
use crate::state::AppState;

/// Directory with CSS and images, relative to the workspace root.
pub const STATIC_DIR: &str = "crates/admin/static";

/// Errors building the application router.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Session(#[from] SessionStoreError),
}

/// Build the full admin application with all middleware.
///
/// # Errors
///
/// Returns `StartupError` if a middleware layer cannot be configured.
pub fn app(state: AppState) -> Result<Router, StartupError> {
    let session_layer = middleware::create_session_layer(state.pool(), state.config())?;
    let media_dir = state.config().media_dir.clone();

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &axum::extract::Request| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
                status = tracing::field::Empty,
                latency_ms = tracing::field::Empty,
            )
        })
        .on_response(
            |response: &axum::response::Response, latency: std::time::Duration, span: &Span| {
                span.record("status", response.status().as_u16());
                span.record(
                    "latency_ms",
                    u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                );
                DefaultOnResponse::default().on_response(response, latency, span);
            },
        );

    Ok(Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .nest_service("/media", ServeDir::new(media_dir))
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(session_layer)
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(trace_layer)
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction()))
}

/// Liveness health check endpoint.
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
    use axum::http::{Request, header};
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::AdminConfig;

    const TEST_DATABASE_URL: &str = "postgres://localhost/trattoria_test";

    fn test_state() -> AppState {
        let config = AdminConfig {
            database_url: SecretString::from(TEST_DATABASE_URL.to_string()),
            host: [127, 0, 0, 1].into(),
            port: 0,
            base_url: "http://localhost:3001".to_string(),
            session_secret: SecretString::from("Vb7nQ1xK9mT4pL2wR8zC5yH3fJ6dG0sA".to_string()),
            media_dir: "./media".into(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
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
        assert_eq!(headers["cache-control"], "no-store");
        assert!(headers.contains_key("x-request-id"));
        let csp = headers["content-security-policy"].to_str().unwrap();
        assert!(csp.contains("frame-ancestors 'none'"));
    }

    #[tokio::test]
    async fn test_pages_redirect_to_login_without_session() {
        let response = app(test_state())
            .unwrap()
            .oneshot(Request::builder().uri("/orders").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/auth/login");
    }

    #[tokio::test]
    async fn test_htmx_requests_get_401_without_session() {
        let response = app(test_state())
            .unwrap()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/products/1/featured")
                    .header("hx-request", "true")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()["hx-redirect"], "/auth/login");
    }
}
