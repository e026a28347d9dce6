//! Customer route handlers.

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{Html, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use trattoria_core::{CustomerId, Order};

use crate::{
    db::{CustomerRepository, CustomerSummary, OrderRepository},
    error::AppError,
    filters,
    middleware::{
        Flash,
        auth::{RequireAdminAuth, RequireWriteAccess},
    },
    state::AppState,
};

use super::dashboard::AdminUserView;
use super::{page_flash, redirect_with, render};

/// Customer search parameters.
#[derive(Debug, Default, Deserialize)]
pub struct CustomerQuery {
    pub q: Option<String>,
}

/// Customers list page template.
#[derive(Template)]
#[template(path = "customers/index.html")]
pub struct CustomersIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub customers: Vec<CustomerSummary>,
    pub search_query: String,
}

/// Customer detail page template.
#[derive(Template)]
#[template(path = "customers/show.html")]
pub struct CustomerShowTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub summary: CustomerSummary,
    pub orders: Vec<Order>,
}

/// Customers list page handler.
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CustomerQuery>,
) -> Html<String> {
    let search_query = query.q.unwrap_or_default();
    let customers = CustomerRepository::new(state.pool())
        .list_with_stats(Some(search_query.as_str()))
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to fetch customers: {e}");
            vec![]
        });

    render(&CustomersIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/customers".to_string(),
        flash: page_flash(&session).await,
        customers,
        search_query,
    })
}

/// Customer detail page handler.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the customer does not exist.
#[instrument(skip(admin, state, session))]
pub async fn show(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Html<String>, AppError> {
    let id = CustomerId::new(id);
    let summary = CustomerRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("customer {id}")))?;
    let orders = OrderRepository::new(state.pool())
        .list_for_customer(id)
        .await?;

    Ok(render(&CustomerShowTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/customers".to_string(),
        flash: page_flash(&session).await,
        summary,
        orders,
    }))
}

/// Disable or re-enable a customer's storefront sign-in.
///
/// # Errors
///
/// Returns `AppError::Database` if the customer does not exist.
#[instrument(skip(admin, state, session))]
pub async fn toggle_disabled(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let customer = CustomerRepository::new(state.pool())
        .toggle_disabled(CustomerId::new(id))
        .await?;
    tracing::info!(
        customer_id = %customer.id,
        disabled = customer.disabled,
        admin = %admin.email,
        "Customer sign-in toggled"
    );

    let message = if customer.disabled {
        format!("{} can no longer sign in.", customer.name)
    } else {
        format!("{} can sign in again.", customer.name)
    };
    redirect_with(
        &session,
        &format!("/customers/{id}"),
        Flash::success(message),
    )
    .await
}
