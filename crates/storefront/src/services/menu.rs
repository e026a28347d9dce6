//! Cached menu reads.
//!
//! Category and menu listings are cached with `moka` for 60 seconds. Cart
//! and checkout never read from this cache, so a stale entry can only
//! affect what is displayed, never what is charged.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::{debug, instrument};

use trattoria_core::{Category, CategoryId, Product, ProductId};

use crate::db::{CategoryRepository, ProductRepository, RepositoryError};

const CACHE_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Categories,
    Menu,
    Featured,
}

#[derive(Debug, Clone)]
enum CacheValue {
    Categories(Arc<Vec<Category>>),
    Menu(Arc<Vec<MenuSection>>),
    Featured(Arc<Vec<Product>>),
}

/// A category with its visible products.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuSection {
    pub category: Category,
    pub products: Vec<Product>,
}

/// Menu page filters.
#[derive(Debug, Clone, Default)]
pub struct MenuFilter {
    pub category: Option<CategoryId>,
    pub query: Option<String>,
}

/// Read access to the public menu.
#[derive(Clone)]
pub struct MenuService {
    pool: PgPool,
    cache: Cache<CacheKey, CacheValue>,
}

impl MenuService {
    /// Create a menu service over `pool`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        let cache = Cache::builder()
            .max_capacity(16)
            .time_to_live(CACHE_TTL)
            .build();
        Self { pool, cache }
    }

    /// Active categories in menu order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the categories cannot be loaded.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Arc<Vec<Category>>, RepositoryError> {
        if let Some(CacheValue::Categories(categories)) =
            self.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let categories = Arc::new(CategoryRepository::new(&self.pool).list_active().await?);
        self.cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(Arc::clone(&categories)),
            )
            .await;
        Ok(categories)
    }

    /// Full menu grouped by category. Empty categories are omitted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the menu cannot be loaded.
    #[instrument(skip(self))]
    pub async fn menu(&self) -> Result<Arc<Vec<MenuSection>>, RepositoryError> {
        if let Some(CacheValue::Menu(menu)) = self.cache.get(&CacheKey::Menu).await {
            debug!("Cache hit for menu");
            return Ok(menu);
        }

        let categories = self.categories().await?;
        let products = ProductRepository::new(&self.pool).list_visible().await?;
        let menu = Arc::new(group_by_category(&categories, products));

        self.cache
            .insert(CacheKey::Menu, CacheValue::Menu(Arc::clone(&menu)))
            .await;
        Ok(menu)
    }

    /// The menu narrowed by category and a case-insensitive text search.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the menu cannot be loaded.
    pub async fn search(&self, filter: &MenuFilter) -> Result<Vec<MenuSection>, RepositoryError> {
        let menu = self.menu().await?;
        Ok(apply_filter(&menu, filter))
    }

    /// Featured, in-stock products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the products cannot be loaded.
    #[instrument(skip(self))]
    pub async fn featured(&self) -> Result<Arc<Vec<Product>>, RepositoryError> {
        if let Some(CacheValue::Featured(products)) = self.cache.get(&CacheKey::Featured).await {
            debug!("Cache hit for featured products");
            return Ok(products);
        }

        let products = Arc::new(ProductRepository::new(&self.pool).list_featured().await?);
        self.cache
            .insert(
                CacheKey::Featured,
                CacheValue::Featured(Arc::clone(&products)),
            )
            .await;
        Ok(products)
    }

    /// A single visible product. Not cached.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        ProductRepository::new(&self.pool).get_visible(id).await
    }
}

fn group_by_category(categories: &[Category], products: Vec<Product>) -> Vec<MenuSection> {
    let mut sections: Vec<MenuSection> = categories
        .iter()
        .map(|category| MenuSection {
            category: category.clone(),
            products: Vec::new(),
        })
        .collect();

    for product in products {
        if let Some(section) = sections
            .iter_mut()
            .find(|s| s.category.id == product.category_id)
        {
            section.products.push(product);
        }
    }

    sections.retain(|s| !s.products.is_empty());
    sections
}

fn apply_filter(menu: &[MenuSection], filter: &MenuFilter) -> Vec<MenuSection> {
    let needle = filter
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase);

    menu.iter()
        .filter(|s| filter.category.is_none_or(|id| s.category.id == id))
        .filter_map(|section| {
            let products: Vec<Product> = section
                .products
                .iter()
                .filter(|p| {
                    needle.as_deref().is_none_or(|n| {
                        p.name.to_lowercase().contains(n)
                            || p.description.to_lowercase().contains(n)
                    })
                })
                .cloned()
                .collect();
            (!products.is_empty()).then(|| MenuSection {
                category: section.category.clone(),
                products,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use trattoria_core::Money;

    use super::*;

    fn category(id: i32, name: &str) -> Category {
        Category {
            id: CategoryId::new(id),
            name: name.to_string(),
            description: String::new(),
            active: true,
            sort_order: id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn product(id: i32, category_id: i32, name: &str, description: &str) -> Product {
        Product {
            id: ProductId::new(id),
            category_id: CategoryId::new(category_id),
            name: name.to_string(),
            description: description.to_string(),
            price: Money::from_cents(1000),
            image_url: None,
            featured: false,
            in_stock: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sample_menu() -> Vec<MenuSection> {
        group_by_category(
            &[category(1, "Pasta"), category(2, "Pizza"), category(3, "Empty")],
            vec![
                product(1, 1, "Carbonara", "Guanciale, egg, pecorino"),
                product(2, 2, "Margherita", "Tomato, mozzarella, basil"),
                product(3, 1, "Pesto Trofie", "Basil pesto"),
                product(4, 9, "Orphan", "Category not active"),
            ],
        )
    }

    #[test]
    fn test_group_by_category_drops_empty_and_orphans() {
        let menu = sample_menu();
        assert_eq!(menu.len(), 2);
        assert_eq!(menu[0].category.name, "Pasta");
        assert_eq!(menu[0].products.len(), 2);
        assert_eq!(menu[1].products.len(), 1);
    }

    #[test]
    fn test_filter_by_category() {
        let filtered = apply_filter(
            &sample_menu(),
            &MenuFilter {
                category: Some(CategoryId::new(2)),
                query: None,
            },
        );
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].products[0].name, "Margherita");
    }

    #[test]
    fn test_filter_by_query_matches_description() {
        let filtered = apply_filter(
            &sample_menu(),
            &MenuFilter {
                category: None,
                query: Some("  BASIL ".to_string()),
            },
        );
        let names: Vec<&str> = filtered
            .iter()
            .flat_map(|s| s.products.iter().map(|p| p.name.as_str()))
            .collect();
        assert_eq!(names, vec!["Pesto Trofie", "Margherita"]);
    }

    #[test]
    fn test_blank_query_is_ignored() {
        let filtered = apply_filter(
            &sample_menu(),
            &MenuFilter {
                category: None,
                query: Some("   ".to_string()),
            },
        );
        assert_eq!(filtered.len(), 2);
    }
}
