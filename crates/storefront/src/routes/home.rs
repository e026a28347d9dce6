//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use trattoria_core::{Category, Product};

use crate::error::AppError;
use crate::filters;
use crate::state::AppState;
use crate::views::Layout;

/// How many featured dishes the home page shows.
const HOME_FEATURED_LIMIT: usize = 6;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub tagline: String,
    pub featured: Vec<Product>,
    pub categories: Vec<Category>,
}

/// Display the home page: featured dishes and menu sections.
///
/// # Errors
///
/// Returns `AppError::Database` if the menu cannot be loaded.
#[instrument(skip(state, layout))]
pub async fn home(
    State(state): State<AppState>,
    layout: Layout,
) -> Result<impl IntoResponse, AppError> {
    let featured = state.menu().featured().await?;
    let categories = state.menu().categories().await?;

    Ok(HomeTemplate {
        tagline: format!("Fresh from the kitchen of {}", state.config().restaurant.name),
        layout,
        featured: featured.iter().take(HOME_FEATURED_LIMIT).cloned().collect(),
        categories: categories.as_ref().clone(),
    })
}
