//! Product management route handlers.

use askama::Template;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use sqlx::PgPool;
use tower_sessions::Session;
use tracing::instrument;

use trattoria_core::{Category, CategoryId, Product, ProductId};

use crate::{
    db::{CategoryRepository, ProductFilter, ProductListing, ProductRepository, RepositoryError},
    error::AppError,
    filters,
    middleware::{
        Flash,
        auth::{RequireAdminAuth, RequireWriteAccess},
    },
    services::{ImageChange, MediaError, ProductError, ProductService},
    state::AppState,
    validation::{ProductForm, validate_image_url, validate_product},
};

use super::dashboard::AdminUserView;
use super::{page_flash, redirect_with, render};

/// Product list query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub q: Option<String>,
    pub category: Option<i32>,
}

/// Products list page template.
#[derive(Template)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub products: Vec<ProductListing>,
    pub categories: Vec<Category>,
    pub selected_category: Option<i32>,
    pub search_query: String,
}

impl ProductsIndexTemplate {
    fn is_selected(&self, category_id: &CategoryId) -> bool {
        self.selected_category == Some(category_id.as_i32())
    }
}

/// Product create/edit form template.
#[derive(Template)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    /// `None` when creating.
    pub product_id: Option<ProductId>,
    pub form: ProductForm,
    pub current_image: Option<String>,
    pub categories: Vec<Category>,
    pub error: Option<String>,
}

impl ProductFormTemplate {
    fn action(&self) -> String {
        self.product_id
            .map_or_else(|| "/products".to_string(), |id| format!("/products/{id}"))
    }

    fn is_selected(&self, category_id: &CategoryId) -> bool {
        self.form.category_id == category_id.to_string()
    }
}

/// Everything a product form submits.
#[derive(Debug, Default)]
struct ProductSubmission {
    form: ProductForm,
    upload: Option<Vec<u8>>,
    remove_image: bool,
}

/// Read the multipart product form.
async fn read_submission(mut multipart: Multipart) -> Result<ProductSubmission, AppError> {
    let mut submission = ProductSubmission::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            submission.upload = Some(bytes.to_vec());
            continue;
        }
        let value = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        match name.as_str() {
            "name" => submission.form.name = value,
            "description" => submission.form.description = value,
            "price" => submission.form.price = value,
            "category_id" => submission.form.category_id = value,
            "image_url" => submission.form.image_url = value,
            "featured" => submission.form.featured = true,
            "in_stock" => submission.form.in_stock = true,
            "remove_image" => submission.remove_image = true,
            _ => {}
        }
    }
    Ok(submission)
}

fn form_from_product(product: &Product) -> ProductForm {
    ProductForm {
        name: product.name.clone(),
        description: product.description.clone(),
        price: product.price.amount().to_string(),
        category_id: product.category_id.to_string(),
        // Stored uploads are shown as a preview, not as an editable URL
        image_url: product
            .image_url
            .clone()
            .filter(|url| !url.starts_with(crate::services::media::MEDIA_URL_PREFIX))
            .unwrap_or_default(),
        featured: product.featured,
        in_stock: product.in_stock,
    }
}

/// Categories a submitted form is validated against.
async fn submission_categories(pool: &PgPool) -> Result<Vec<Category>, AppError> {
    Ok(CategoryRepository::new(pool).list_all().await?)
}

/// Categories for a page's dropdown. A failed lookup leaves it empty.
async fn load_categories(state: &AppState) -> Vec<Category> {
    CategoryRepository::new(state.pool())
        .list_all()
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to fetch categories: {e}");
            vec![]
        })
}

/// Products list page handler.
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ProductQuery>,
) -> Html<String> {
    let filter = ProductFilter {
        category: query.category.map(CategoryId::new),
        query: query.q.clone(),
    };
    let products = ProductRepository::new(state.pool())
        .list(&filter)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to fetch products: {e}");
            vec![]
        });

    render(&ProductsIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/products".to_string(),
        flash: page_flash(&session).await,
        products,
        categories: load_categories(&state).await,
        selected_category: query.category,
        search_query: query.q.unwrap_or_default(),
    })
}

/// New product form.
#[instrument(skip(admin, state))]
pub async fn new(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
) -> Html<String> {
    render(&ProductFormTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/products".to_string(),
        flash: None,
        product_id: None,
        form: ProductForm {
            in_stock: true,
            ..ProductForm::default()
        },
        current_image: None,
        categories: load_categories(&state).await,
        error: None,
    })
}

/// Edit product form.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the product does not exist.
#[instrument(skip(admin, state))]
pub async fn edit(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Html<String>, AppError> {
    let product = ProductRepository::new(state.pool())
        .get(ProductId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    Ok(render(&ProductFormTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/products".to_string(),
        flash: None,
        product_id: Some(product.id),
        form: form_from_product(&product),
        current_image: product.image_url,
        categories: load_categories(&state).await,
        error: None,
    }))
}

/// Create a product.
///
/// # Errors
///
/// Returns `AppError` for storage failures. Invalid input re-renders the
/// form with a message.
#[instrument(skip(admin, state, session, multipart))]
pub async fn create(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> Result<Response, AppError> {
    save(&admin_view(&admin), &state, &session, None, multipart).await
}

/// Update a product.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the product does not exist.
#[instrument(skip(admin, state, session, multipart))]
pub async fn update(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    save(
        &admin_view(&admin),
        &state,
        &session,
        Some(ProductId::new(id)),
        multipart,
    )
    .await
}

fn admin_view(admin: &crate::models::CurrentAdmin) -> AdminUserView {
    AdminUserView::from(admin)
}

/// Shared create/update flow.
async fn save(
    admin: &AdminUserView,
    state: &AppState,
    session: &Session,
    id: Option<ProductId>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let submission = read_submission(multipart).await?;
    let categories = submission_categories(state.pool()).await?;
    let service = ProductService::new(state.pool(), state.media());

    let rerender = |error: String,
                    status: StatusCode,
                    current_image: Option<String>|
     -> Result<Response, AppError> {
        let page = render(&ProductFormTemplate {
            admin_user: admin.clone(),
            current_path: "/products".to_string(),
            flash: None,
            product_id: id,
            form: submission.form.clone(),
            current_image,
            categories: categories.clone(),
            error: Some(error),
        });
        Ok((status, page).into_response())
    };

    let current_image = match id {
        Some(id) => ProductRepository::new(state.pool())
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("product {id}")))?
            .image_url,
        None => None,
    };

    let validated = validate_product(&submission.form, &categories).and_then(|input| {
        validate_image_url(&submission.form.image_url).map(|url| (input, url))
    });
    let (input, url) = match validated {
        Ok(valid) => valid,
        Err(e) => return rerender(e.to_string(), StatusCode::UNPROCESSABLE_ENTITY, current_image),
    };
    let image = ImageChange::from_form(submission.upload.clone(), url, submission.remove_image);

    let result = match id {
        Some(id) => service.update(id, input, image).await,
        None => service.create(input, image).await,
    };

    match result {
        Ok(product) => {
            redirect_with(
                session,
                "/products",
                Flash::success(format!("Saved {}.", product.name)),
            )
            .await
        }
        Err(ProductError::Media(e)) if !matches!(e, MediaError::Io(_)) => {
            rerender(e.to_string(), StatusCode::UNPROCESSABLE_ENTITY, current_image)
        }
        Err(e) => Err(e.into()),
    }
}

/// Delete a product.
///
/// # Errors
///
/// Returns `AppError::Product` if the product does not exist.
#[instrument(skip(admin, state, session))]
pub async fn delete(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    ProductService::new(state.pool(), state.media())
        .delete(ProductId::new(id))
        .await?;
    tracing::info!(admin = %admin.email, product_id = id, "Product deleted by admin");
    redirect_with(&session, "/products", Flash::success("Product deleted.")).await
}

/// Product row partial, swapped in after a toggle.
#[derive(Template)]
#[template(path = "partials/product_row.html")]
pub struct ProductRowTemplate {
    pub listing: ProductListing,
    pub can_write: bool,
}

/// Which flag a toggle route flips.
#[derive(Debug, Clone, Copy)]
enum ProductFlag {
    Featured,
    InStock,
}

async fn toggle(
    admin: &AdminUserView,
    state: &AppState,
    id: i32,
    flag: ProductFlag,
) -> Result<Response, AppError> {
    let repo = ProductRepository::new(state.pool());
    let id = ProductId::new(id);
    let result = match flag {
        ProductFlag::Featured => repo.toggle_featured(id).await,
        ProductFlag::InStock => repo.toggle_stock(id).await,
    };
    let product = result.map_err(|e| match e {
        RepositoryError::NotFound => AppError::NotFound(format!("product {id}")),
        other => other.into(),
    })?;
    let category_name = CategoryRepository::new(state.pool())
        .get(product.category_id)
        .await?
        .map(|c| c.name)
        .unwrap_or_default();

    Ok(render(&ProductRowTemplate {
        listing: ProductListing {
            product,
            category_name,
        },
        can_write: admin.can_write,
    })
    .into_response())
}

/// Toggle whether a product is featured on the home page.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the product does not exist.
#[instrument(skip(admin, state))]
pub async fn toggle_featured(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    toggle(&admin_view(&admin), &state, id, ProductFlag::Featured).await
}

/// Toggle whether a product can be ordered.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the product does not exist.
#[instrument(skip(admin, state))]
pub async fn toggle_stock(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    toggle(&admin_view(&admin), &state, id, ProductFlag::InStock).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use sqlx::postgres::PgPoolOptions;
    use trattoria_core::Money;

    use super::*;
    use crate::validation::ValidationError;

    fn product(image_url: Option<&str>) -> Product {
        Product {
            id: ProductId::new(7),
            category_id: CategoryId::new(2),
            name: "Tiramisu".to_string(),
            description: "Mascarpone, espresso".to_string(),
            price: Money::from_cents(850),
            image_url: image_url.map(String::from),
            featured: false,
            in_stock: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_form_from_product() {
        let form = form_from_product(&product(Some("https://cdn.example.com/t.jpg")));
        assert_eq!(form.price, "8.50");
        assert_eq!(form.category_id, "2");
        assert_eq!(form.image_url, "https://cdn.example.com/t.jpg");
        assert!(form.in_stock);
    }

    #[test]
    fn test_stored_upload_is_not_an_editable_url() {
        let form = form_from_product(&product(Some("/media/products/abc.png")));
        assert_eq!(form.image_url, "");
    }

    fn category(id: i32, name: &str) -> Category {
        Category {
            id: CategoryId::new(id),
            name: name.to_string(),
            description: String::new(),
            active: true,
            sort_order: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn admin() -> AdminUserView {
        AdminUserView {
            name: "Giulia".to_string(),
            email: "giulia@example.com".to_string(),
            is_super_admin: false,
            can_write: true,
        }
    }

    #[test]
    fn test_index_marks_selected_category() {
        let page = ProductsIndexTemplate {
            admin_user: admin(),
            current_path: "/products".to_string(),
            flash: None,
            products: vec![],
            categories: vec![category(1, "Pasta"), category(2, "Dolci")],
            selected_category: Some(2),
            search_query: String::new(),
        };
        assert!(page.is_selected(&CategoryId::new(2)));
        assert!(!page.is_selected(&CategoryId::new(1)));

        let html = page.render().unwrap();
        assert!(html.contains(r#"<option value="2" selected>Dolci</option>"#));
        assert!(html.contains(r#"<option value="1" >Pasta</option>"#));
    }

    #[test]
    fn test_form_marks_selected_category() {
        let page = ProductFormTemplate {
            admin_user: admin(),
            current_path: "/products".to_string(),
            flash: None,
            product_id: Some(ProductId::new(7)),
            form: form_from_product(&product(None)),
            current_image: None,
            categories: vec![category(1, "Pasta"), category(2, "Dolci")],
            error: None,
        };
        assert!(page.is_selected(&CategoryId::new(2)));
        assert!(!page.is_selected(&CategoryId::new(1)));
        assert!(page.render().unwrap().contains(r#"action="/products/7""#));
    }

    #[tokio::test]
    async fn test_category_lookup_failure_on_save_is_a_server_error() {
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy("postgres://trattoria@127.0.0.1:1/trattoria")
            .unwrap();

        let err = submission_categories(&pool).await.unwrap_err();
        assert!(matches!(err, AppError::Database(RepositoryError::Database(_))));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_validation_error_message_is_user_facing() {
        assert_eq!(
            ValidationError::UnknownCategory.to_string(),
            "Choose a category"
        );
    }
}
