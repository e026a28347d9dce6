//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /services               - Dine-in, pickup, and delivery
//! GET  /offers                 - Featured dishes
//! GET  /location               - Address and hours
//!
//! # Menu
//! GET  /menu                   - Menu by category (?category=, ?q=)
//! GET  /menu/{id}              - Dish detail
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart (returns count, triggers cart-updated)
//! POST /cart/update            - Update quantity (returns cart_items fragment)
//! POST /cart/remove            - Remove item (returns cart_items fragment)
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Checkout
//! GET  /checkout               - Checkout form
//! GET  /checkout/quote         - Totals fragment for ?order_type=
//! POST /checkout               - Place order
//!
//! # Orders
//! GET  /orders                 - Order history (requires auth)
//! GET  /orders/{id}            - Tracking page
//! GET  /orders/{id}/status     - Status fragment (polled)
//! POST /orders/{id}/cancel     - Cancel a pending order
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action
//! GET  /auth/register          - Register page
//! POST /auth/register          - Register action
//! POST /auth/logout            - Logout action
//!
//! # Account (requires auth)
//! GET  /account                - Profile and recent orders
//! POST /account                - Update profile
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod menu;
pub mod orders;
pub mod pages;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{RateLimitConfigError, auth_rate_limiter, checkout_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router. Form posts are rate limited.
///
/// # Errors
///
/// Returns `RateLimitConfigError` if the limiter cannot be built.
pub fn auth_routes() -> Result<Router<AppState>, RateLimitConfigError> {
    let limited = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .layer(auth_rate_limiter()?);

    Ok(Router::new()
        .route("/login", get(auth::login_page))
        .route("/register", get(auth::register_page))
        .route("/logout", post(auth::logout))
        .merge(limited))
}

/// Create the menu routes router.
pub fn menu_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(menu::index))
        .route("/{id}", get(menu::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
}

/// Create the checkout routes router. Placing an order is rate limited.
///
/// # Errors
///
/// Returns `RateLimitConfigError` if the limiter cannot be built.
pub fn checkout_routes() -> Result<Router<AppState>, RateLimitConfigError> {
    let place = Router::new()
        .route("/", post(checkout::place))
        .layer(checkout_rate_limiter()?);

    Ok(Router::new()
        .route("/", get(checkout::show))
        .route("/quote", get(checkout::quote))
        .merge(place))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", get(orders::status))
        .route("/{id}/cancel", post(orders::cancel))
}

/// Create all page routes for the storefront.
///
/// # Errors
///
/// Returns `RateLimitConfigError` if a rate limiter cannot be built.
pub fn routes() -> Result<Router<AppState>, RateLimitConfigError> {
    Ok(Router::new()
        .route("/", get(home::home))
        .route("/services", get(pages::services))
        .route("/offers", get(pages::offers))
        .route("/location", get(pages::location))
        .nest("/menu", menu_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes()?)
        .nest("/orders", order_routes())
        .route("/account", get(account::show).post(account::update))
        .nest("/auth", auth_routes()?))
}
