//! Menu route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use trattoria_core::{Category, CategoryId, Product, ProductId};

use crate::error::AppError;
use crate::filters;
use crate::services::{MenuFilter, MenuSection};
use crate::state::AppState;
use crate::views::Layout;

/// Menu page query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct MenuQuery {
    pub category: Option<i32>,
    pub q: Option<String>,
}

/// Menu page template.
#[derive(Template, WebTemplate)]
#[template(path = "menu/index.html")]
pub struct MenuTemplate {
    pub layout: Layout,
    pub sections: Vec<MenuSection>,
    pub categories: Vec<Category>,
    pub selected_category: Option<i32>,
    pub query: String,
}

impl MenuTemplate {
    fn is_selected(&self, category_id: i32) -> bool {
        self.selected_category == Some(category_id)
    }
}

/// Product detail template.
#[derive(Template, WebTemplate)]
#[template(path = "menu/show.html")]
pub struct ProductTemplate {
    pub layout: Layout,
    pub product: Product,
    pub category: Option<Category>,
}

/// Display the menu grouped by category.
///
/// # Errors
///
/// Returns `AppError::Database` if the menu cannot be loaded.
#[instrument(skip(state, layout))]
pub async fn index(
    State(state): State<AppState>,
    layout: Layout,
    Query(query): Query<MenuQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = MenuFilter {
        category: query.category.map(CategoryId::new),
        query: query.q.clone(),
    };
    let sections = state.menu().search(&filter).await?;
    let categories = state.menu().categories().await?;

    Ok(MenuTemplate {
        layout,
        sections,
        categories: categories.as_ref().clone(),
        selected_category: query.category,
        query: query.q.unwrap_or_default(),
    })
}

/// Display a single dish.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the product is missing or hidden.
#[instrument(skip(state, layout))]
pub async fn show(
    State(state): State<AppState>,
    layout: Layout,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let product = state
        .menu()
        .product(ProductId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    let category = state
        .menu()
        .categories()
        .await?
        .iter()
        .find(|c| c.id == product.category_id)
        .cloned();

    Ok(ProductTemplate {
        layout,
        product,
        category,
    })
}
