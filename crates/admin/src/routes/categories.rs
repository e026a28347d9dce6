//! Category management route handlers.

use askama::Template;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use trattoria_core::{Category, CategoryId};

use crate::{
    db::{CategoryRepository, CategoryWithCount, RepositoryError},
    error::AppError,
    filters,
    middleware::{
        Flash,
        auth::{RequireAdminAuth, RequireWriteAccess},
    },
    state::AppState,
    validation::{CategoryForm, validate_category},
};

use super::dashboard::AdminUserView;
use super::{page_flash, redirect_with, render};

/// Categories list page template.
#[derive(Template)]
#[template(path = "categories/index.html")]
pub struct CategoriesIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub categories: Vec<CategoryWithCount>,
}

/// Category create/edit form template.
#[derive(Template)]
#[template(path = "categories/form.html")]
pub struct CategoryFormTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    /// `None` when creating.
    pub category_id: Option<CategoryId>,
    pub form: CategoryForm,
    pub error: Option<String>,
}

impl CategoryFormTemplate {
    fn action(&self) -> String {
        self.category_id
            .map_or_else(|| "/categories".to_string(), |id| format!("/categories/{id}"))
    }
}

fn form_from_category(category: &Category) -> CategoryForm {
    CategoryForm {
        name: category.name.clone(),
        description: category.description.clone(),
        sort_order: category.sort_order.to_string(),
        active: category.active.then(|| "on".to_string()),
    }
}

/// Categories list page handler.
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Html<String> {
    let categories = CategoryRepository::new(state.pool())
        .list_with_counts()
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to fetch categories: {e}");
            vec![]
        });

    render(&CategoriesIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/categories".to_string(),
        flash: page_flash(&session).await,
        categories,
    })
}

/// New category form.
pub async fn new(RequireWriteAccess(admin): RequireWriteAccess) -> Html<String> {
    render(&CategoryFormTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/categories".to_string(),
        flash: None,
        category_id: None,
        form: CategoryForm {
            active: Some("on".to_string()),
            ..CategoryForm::default()
        },
        error: None,
    })
}

/// Edit category form.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the category does not exist.
#[instrument(skip(admin, state))]
pub async fn edit(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Html<String>, AppError> {
    let category = CategoryRepository::new(state.pool())
        .get(CategoryId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("category {id}")))?;

    Ok(render(&CategoryFormTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/categories".to_string(),
        flash: None,
        category_id: Some(category.id),
        form: form_from_category(&category),
        error: None,
    }))
}

/// Create a category.
///
/// # Errors
///
/// Returns `AppError` for database failures. Invalid or duplicate names
/// re-render the form.
#[instrument(skip(admin, state, session, form))]
pub async fn create(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CategoryForm>,
) -> Result<Response, AppError> {
    save(AdminUserView::from(&admin), &state, &session, None, form).await
}

/// Update a category.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the category does not exist.
#[instrument(skip(admin, state, session, form))]
pub async fn update(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    Form(form): Form<CategoryForm>,
) -> Result<Response, AppError> {
    save(
        AdminUserView::from(&admin),
        &state,
        &session,
        Some(CategoryId::new(id)),
        form,
    )
    .await
}

async fn save(
    admin_user: AdminUserView,
    state: &AppState,
    session: &Session,
    id: Option<CategoryId>,
    form: CategoryForm,
) -> Result<Response, AppError> {
    let rerender = |form: CategoryForm, error: String, status: StatusCode| -> Response {
        let page = render(&CategoryFormTemplate {
            admin_user: admin_user.clone(),
            current_path: "/categories".to_string(),
            flash: None,
            category_id: id,
            form,
            error: Some(error),
        });
        (status, page).into_response()
    };

    let input = match validate_category(&form) {
        Ok(input) => input,
        Err(e) => return Ok(rerender(form, e.to_string(), StatusCode::UNPROCESSABLE_ENTITY)),
    };

    let repo = CategoryRepository::new(state.pool());
    let result = match id {
        Some(id) => repo.update(id, &input).await,
        None => repo.create(&input).await,
    };

    match result {
        Ok(category) => {
            tracing::info!(category_id = %category.id, "Category saved");
            redirect_with(
                session,
                "/categories",
                Flash::success(format!("Saved {}.", category.name)),
            )
            .await
        }
        Err(RepositoryError::Conflict(_)) => Ok(rerender(
            form,
            "A category with this name already exists".to_string(),
            StatusCode::CONFLICT,
        )),
        Err(RepositoryError::NotFound) => Err(AppError::NotFound("category".to_string())),
        Err(e) => Err(e.into()),
    }
}

/// Delete a category. Refused while products still reference it.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the category does not exist.
#[instrument(skip(admin, state, session))]
pub async fn delete(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    match CategoryRepository::new(state.pool())
        .delete(CategoryId::new(id))
        .await
    {
        Ok(()) => {
            tracing::info!(admin = %admin.email, category_id = id, "Category deleted");
            redirect_with(&session, "/categories", Flash::success("Category deleted.")).await
        }
        Err(RepositoryError::Conflict(message)) => {
            redirect_with(&session, "/categories", Flash::error(message)).await
        }
        Err(RepositoryError::NotFound) => Err(AppError::NotFound(format!("category {id}"))),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn test_form_round_trips_through_validation() {
        let category = Category {
            id: CategoryId::new(1),
            name: "Pizza".to_string(),
            description: "Wood-fired".to_string(),
            active: false,
            sort_order: 4,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let input = validate_category(&form_from_category(&category)).unwrap();
        assert_eq!(input.name, "Pizza");
        assert_eq!(input.sort_order, 4);
        assert!(!input.active);
    }
}
