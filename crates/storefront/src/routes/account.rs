//! Account route handlers.
//!
//! These routes require authentication.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use trattoria_core::Customer;

use crate::db::{CustomerRepository, customers::ProfileUpdate};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{RequireAuth, set_current_customer};
use crate::models::CurrentCustomer;
use crate::services::OrderService;
use crate::state::AppState;
use crate::views::{Layout, OrderSummaryView};

/// Orders shown on the account page.
const RECENT_ORDER_LIMIT: usize = 5;

const MAX_NAME_LENGTH: usize = 120;
const MAX_PHONE_LENGTH: usize = 40;
const MAX_ADDRESS_LENGTH: usize = 500;

/// Profile form data.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Profile display data for templates.
#[derive(Debug, Clone)]
pub struct ProfileView {
    pub email: String,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub member_since: String,
}

impl From<&Customer> for ProfileView {
    fn from(customer: &Customer) -> Self {
        Self {
            email: customer.email.to_string(),
            name: customer.name.clone(),
            phone: customer.phone.clone().unwrap_or_default(),
            address: customer.address.clone().unwrap_or_default(),
            member_since: customer.created_at.format("%B %Y").to_string(),
        }
    }
}

/// Account page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/show.html")]
pub struct AccountTemplate {
    pub layout: Layout,
    pub profile: ProfileView,
    pub recent_orders: Vec<OrderSummaryView>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Trim and validate a profile form.
///
/// # Errors
///
/// Returns a message for the first invalid field.
pub fn validate_profile(form: &ProfileForm) -> Result<ProfileUpdate, String> {
    let name = form.name.trim();
    if name.is_empty() {
        return Err("Please enter your name.".to_string());
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err("Name is too long.".to_string());
    }

    let clean = |value: &Option<String>, max: usize, field: &str| {
        match value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) if v.chars().count() > max => Err(format!("{field} is too long.")),
            other => Ok(other.map(String::from)),
        }
    };

    Ok(ProfileUpdate {
        name: name.to_string(),
        phone: clean(&form.phone, MAX_PHONE_LENGTH, "Phone")?,
        address: clean(&form.address, MAX_ADDRESS_LENGTH, "Address")?,
    })
}

async fn render(
    state: &AppState,
    layout: Layout,
    customer: &Customer,
    current: &CurrentCustomer,
    error: Option<String>,
    success: Option<String>,
) -> Result<AccountTemplate, AppError> {
    let orders = OrderService::new(state.pool()).history_for(current).await?;
    Ok(AccountTemplate {
        layout,
        profile: ProfileView::from(customer),
        recent_orders: orders
            .iter()
            .take(RECENT_ORDER_LIMIT)
            .map(OrderSummaryView::from)
            .collect(),
        error,
        success,
    })
}

/// Display the account page.
///
/// # Errors
///
/// Returns `AppError` if the profile cannot be loaded.
#[instrument(skip(state, layout, current))]
pub async fn show(
    State(state): State<AppState>,
    layout: Layout,
    RequireAuth(current): RequireAuth,
) -> Result<impl IntoResponse, AppError> {
    let customer = CustomerRepository::new(state.pool())
        .get_by_id(current.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("account no longer exists".to_string()))?;

    render(&state, layout, &customer, &current, None, None).await
}

/// Update name, phone, and address.
///
/// # Errors
///
/// Returns `AppError` if the profile cannot be saved.
#[instrument(skip(state, session, layout, current, form))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    mut layout: Layout,
    RequireAuth(current): RequireAuth,
    Form(form): Form<ProfileForm>,
) -> Result<Response, AppError> {
    let repo = CustomerRepository::new(state.pool());

    let update = match validate_profile(&form) {
        Ok(update) => update,
        Err(message) => {
            let customer = repo
                .get_by_id(current.id)
                .await?
                .ok_or_else(|| AppError::Unauthorized("account no longer exists".to_string()))?;
            let page = render(&state, layout, &customer, &current, Some(message), None).await?;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    let customer = repo.update_profile(current.id, &update).await?;
    let refreshed = CurrentCustomer::from(&customer);
    set_current_customer(&session, &refreshed).await?;
    layout.customer = Some(refreshed.clone());

    tracing::info!(customer_id = %customer.id, "Profile updated");
    let page = render(
        &state,
        layout,
        &customer,
        &refreshed,
        None,
        Some("Profile saved.".to_string()),
    )
    .await?;
    Ok(page.into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(name: &str, phone: Option<&str>, address: Option<&str>) -> ProfileForm {
        ProfileForm {
            name: name.to_string(),
            phone: phone.map(String::from),
            address: address.map(String::from),
        }
    }

    #[test]
    fn test_blank_optional_fields_become_none() {
        let update = validate_profile(&form(" Marco ", Some("  "), Some(""))).unwrap();
        assert_eq!(update.name, "Marco");
        assert_eq!(update.phone, None);
        assert_eq!(update.address, None);
    }

    #[test]
    fn test_profile_requires_name() {
        assert!(validate_profile(&form("  ", None, None)).is_err());
    }

    #[test]
    fn test_profile_rejects_long_address() {
        let long = "a".repeat(501);
        assert_eq!(
            validate_profile(&form("Marco", None, Some(&long))).unwrap_err(),
            "Address is too long."
        );
    }
}
