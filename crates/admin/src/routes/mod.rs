//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health, /health/ready      - Health checks (see lib.rs)
//!
//! # Dashboard
//! GET  /                           - Today's orders, revenue, open orders
//!
//! # Auth
//! GET  /auth/login                 - Login page
//! POST /auth/login                 - Password login
//! POST /auth/logout                - Logout
//!
//! # Menu
//! GET  /products                   - Product list (?q=, ?category=)
//! GET  /products/new               - New product form
//! POST /products                   - Create product (multipart)
//! GET  /products/{id}/edit         - Edit form
//! POST /products/{id}              - Update product (multipart)
//! POST /products/{id}/delete       - Delete product and its image
//! POST /products/{id}/featured     - Toggle featured
//! POST /products/{id}/stock        - Toggle in stock
//! GET  /categories                 - Category list with product counts
//! GET  /categories/new             - New category form
//! POST /categories                 - Create category
//! GET  /categories/{id}/edit       - Edit form
//! POST /categories/{id}            - Update category
//! POST /categories/{id}/delete     - Delete an empty category
//!
//! # Orders
//! GET  /orders                     - Queue (?status=, ?order_type=, ?q=)
//! GET  /orders/{id}                - Detail with next-status buttons
//! POST /orders/{id}/status         - Apply a lifecycle transition
//! POST /orders/{id}/delete         - Delete (super admin only)
//!
//! # Customers
//! GET  /customers                  - List with order count and spend
//! GET  /customers/{id}             - Profile and order history
//! POST /customers/{id}/disable     - Toggle disabled
//!
//! # Admin Users (super admin only)
//! GET  /admin-users                - List admin users
//! POST /admin-users                - Create admin user
//! POST /admin-users/{id}/delete    - Remove admin user
//! ```

pub mod admin_users;
pub mod auth;
pub mod categories;
pub mod customers;
pub mod dashboard;
pub mod orders;
pub mod products;

use askama::Template;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tower_sessions::Session;

use crate::error::AppError;
use crate::middleware::{Flash, set_flash, take_flash};
use crate::services::media::MAX_IMAGE_BYTES;
use crate::state::AppState;

/// Room for the form fields around an image upload.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build the admin router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        .merge(auth::router())
        .merge(product_routes())
        .route(
            "/categories",
            get(categories::index).post(categories::create),
        )
        .route("/categories/new", get(categories::new))
        .route("/categories/{id}", post(categories::update))
        .route("/categories/{id}/edit", get(categories::edit))
        .route("/categories/{id}/delete", post(categories::delete))
        .route("/orders", get(orders::index))
        .route("/orders/{id}", get(orders::show))
        .route("/orders/{id}/status", post(orders::update_status))
        .route("/orders/{id}/delete", post(orders::delete))
        .route("/customers", get(customers::index))
        .route("/customers/{id}", get(customers::show))
        .route("/customers/{id}/disable", post(customers::toggle_disabled))
        .route(
            "/admin-users",
            get(admin_users::index).post(admin_users::create),
        )
        .route("/admin-users/{id}/delete", post(admin_users::delete))
}

/// Product routes; the multipart forms get a larger body limit.
fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index).post(products::create))
        .route("/products/new", get(products::new))
        .route("/products/{id}", post(products::update))
        .route("/products/{id}/edit", get(products::edit))
        .route("/products/{id}/delete", post(products::delete))
        .route("/products/{id}/featured", post(products::toggle_featured))
        .route("/products/{id}/stock", post(products::toggle_stock))
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + MULTIPART_OVERHEAD))
}

/// Render a template, logging failures.
pub(crate) fn render(template: &impl Template) -> Html<String> {
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    }))
}

/// Take the pending flash message for a page render.
pub(crate) async fn page_flash(session: &Session) -> Option<Flash> {
    take_flash(session).await.unwrap_or_else(|e| {
        tracing::warn!("Failed to read flash message: {e}");
        None
    })
}

/// Redirect to `to`, showing `flash` on the next page.
///
/// # Errors
///
/// Returns `AppError::Session` if the flash cannot be stored.
pub(crate) async fn redirect_with(
    session: &Session,
    to: &str,
    flash: Flash,
) -> Result<Response, AppError> {
    set_flash(session, flash).await?;
    Ok(Redirect::to(to).into_response())
}
