//! Session middleware configuration.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions. The cart,
//! guest order IDs, and signed-in customer all live in the session.

use sqlx::PgPool;
use tower_sessions::{Expiry, Session, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use trattoria_core::OrderId;

use crate::config::StorefrontConfig;
use crate::models::{Cart, session_keys};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "trattoria_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// How many guest orders a session remembers.
const MAX_GUEST_ORDERS: usize = 20;

/// The session store rejected its schema or table name.
#[derive(Debug, thiserror::Error)]
#[error("invalid session store setting: {0}")]
pub struct SessionStoreError(String);

/// Create the session layer with `PostgreSQL` store.
///
/// Sessions live in `storefront.session`, created by migration.
///
/// # Errors
///
/// Returns `SessionStoreError` if the schema or table name is rejected.
pub fn create_session_layer(
    pool: &PgPool,
    config: &StorefrontConfig,
) -> Result<SessionManagerLayer<PostgresStore>, SessionStoreError> {
    let store = PostgresStore::new(pool.clone())
        .with_schema_name("storefront")
        .map_err(SessionStoreError)?
        .with_table_name("session")
        .map_err(SessionStoreError)?;

    let is_secure = config.base_url.starts_with("https://");

    Ok(SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/"))
}

/// Load the cart from the session, empty if absent.
///
/// # Errors
///
/// Returns an error if the session store cannot be read.
pub async fn load_cart(session: &Session) -> Result<Cart, tower_sessions::session::Error> {
    Ok(session.get::<Cart>(session_keys::CART).await?.unwrap_or_default())
}

/// Store the cart in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn save_cart(session: &Session, cart: &Cart) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CART, cart).await
}

/// Orders placed from this session.
///
/// # Errors
///
/// Returns an error if the session store cannot be read.
pub async fn guest_orders(session: &Session) -> Result<Vec<OrderId>, tower_sessions::session::Error> {
    Ok(session
        .get::<Vec<OrderId>>(session_keys::GUEST_ORDERS)
        .await?
        .unwrap_or_default())
}

/// Remember an order so this session can track it without signing in.
///
/// Only the most recent orders are kept.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn remember_guest_order(
    session: &Session,
    order_id: OrderId,
) -> Result<(), tower_sessions::session::Error> {
    let mut orders = guest_orders(session).await?;
    if !orders.contains(&order_id) {
        orders.push(order_id);
    }
    let excess = orders.len().saturating_sub(MAX_GUEST_ORDERS);
    orders.drain(..excess);
    session.insert(session_keys::GUEST_ORDERS, orders).await
}
