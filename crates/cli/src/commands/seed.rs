//! Demo menu seeding.
//!
//! Categories are matched by name (case-insensitive) and products by name
//! within their category, so running the command again only fills gaps.

use trattoria_admin::db::categories::CategoryInput;
use trattoria_admin::db::products::ProductInput;
use trattoria_admin::db::{CategoryRepository, ProductFilter, ProductRepository};
use trattoria_core::{Category, Money};

/// A demo dish: name, description, price in cents, featured.
type Dish = (&'static str, &'static str, i64, bool);

/// Demo categories in menu order, each with its dishes.
const MENU: &[(&str, &str, &[Dish])] = &[
    (
        "Antipasti",
        "To start",
        &[
            ("Bruschetta", "Grilled bread, tomato, garlic, basil", 850, false),
            ("Arancini", "Fried risotto balls with mozzarella", 950, true),
            ("Burrata", "With cherry tomatoes and olive oil", 1400, false),
        ],
    ),
    (
        "Pasta",
        "Made fresh every morning",
        &[
            ("Spaghetti Carbonara", "Guanciale, egg yolk, pecorino", 1650, true),
            ("Tagliatelle al Ragù", "Slow-cooked beef and pork ragù", 1750, false),
            ("Penne all'Arrabbiata", "Spicy tomato sauce", 1350, false),
        ],
    ),
    (
        "Pizza",
        "Wood-fired, 12 inch",
        &[
            ("Margherita", "Tomato, fior di latte, basil", 1300, true),
            ("Diavola", "Spicy salami, tomato, mozzarella", 1550, false),
            ("Quattro Formaggi", "Four cheeses, no tomato", 1600, false),
        ],
    ),
    (
        "Dolci",
        "Desserts",
        &[
            ("Tiramisù", "Mascarpone, espresso, cocoa", 850, true),
            ("Panna Cotta", "With berry compote", 750, false),
        ],
    ),
    (
        "Bevande",
        "Drinks",
        &[
            ("San Pellegrino", "Sparkling water, 500 ml", 350, false),
            ("Espresso", "Double shot", 300, false),
        ],
    ),
];

/// Counts of rows inserted by a seeding run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub categories: usize,
    pub products: usize,
}

/// Find a category by name, ignoring case.
fn find_category<'a>(existing: &'a [Category], name: &str) -> Option<&'a Category> {
    existing.iter().find(|c| c.name.eq_ignore_ascii_case(name))
}

/// Insert the demo menu, skipping entries that already exist.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails.
pub async fn menu() -> Result<(), Box<dyn std::error::Error>> {
    let pool = super::connect().await?;
    let categories = CategoryRepository::new(&pool);
    let products = ProductRepository::new(&pool);

    let mut existing = categories.list_all().await?;
    let mut report = SeedReport::default();

    for (position, (name, description, dishes)) in (1..).zip(MENU) {
        let category = if let Some(category) = find_category(&existing, name) {
            category.clone()
        } else {
            let created = categories
                .create(&CategoryInput {
                    name: (*name).to_string(),
                    description: (*description).to_string(),
                    active: true,
                    sort_order: position,
                })
                .await?;
            report.categories += 1;
            existing.push(created.clone());
            created
        };

        let listed = products
            .list(&ProductFilter {
                category: Some(category.id),
                query: None,
            })
            .await?;

        for (dish, dish_description, cents, featured) in *dishes {
            if listed
                .iter()
                .any(|l| l.product.name.eq_ignore_ascii_case(dish))
            {
                continue;
            }
            products
                .create(&ProductInput {
                    category_id: category.id,
                    name: (*dish).to_string(),
                    description: (*dish_description).to_string(),
                    price: Money::from_cents(*cents),
                    image_url: None,
                    featured: *featured,
                    in_stock: true,
                })
                .await?;
            report.products += 1;
        }
    }

    tracing::info!(
        categories = report.categories,
        products = report.products,
        "Demo menu seeded"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_menu_has_unique_names() {
        let mut names: Vec<String> = MENU
            .iter()
            .flat_map(|(_, _, dishes)| dishes.iter().map(|d| d.0.to_lowercase()))
            .collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn test_demo_prices_are_positive() {
        for (_, _, dishes) in MENU {
            for (name, _, cents, _) in *dishes {
                assert!(*cents > 0, "{name} has no price");
            }
        }
    }
}
