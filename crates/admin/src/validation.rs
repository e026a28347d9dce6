//! Form validation for menu management.
//!
//! Handlers hand raw form strings to these functions and get back the
//! typed inputs the repositories accept.

use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use trattoria_core::{Category, CategoryId, Money};

use crate::db::categories::CategoryInput;
use crate::db::products::ProductInput;
use crate::services::media::MEDIA_URL_PREFIX;

pub const MAX_PRODUCT_NAME: usize = 120;
pub const MAX_CATEGORY_NAME: usize = 80;
pub const MAX_DESCRIPTION: usize = 500;

/// Highest price accepted for a single menu item.
const MAX_PRICE_CENTS: i64 = 100_000;

/// A form field that failed validation. The message is shown to the admin.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Name is required")]
    NameRequired,

    #[error("Name must be at most {max} characters")]
    NameTooLong { max: usize },

    #[error("Description must be at most {max} characters")]
    DescriptionTooLong { max: usize },

    #[error("Price must be a number like 12.50")]
    InvalidPrice,

    #[error("Price cannot be negative")]
    NegativePrice,

    #[error("Price can have at most two decimal places")]
    TooManyDecimals,

    #[error("Price is too high")]
    PriceTooHigh,

    #[error("Choose a category")]
    UnknownCategory,

    #[error("Image URL must start with http://, https:// or /")]
    InvalidImageUrl,

    #[error("Upload the image instead of linking to a stored file")]
    StoredImageUrl,

    #[error("Sort order must be a whole number")]
    InvalidSortOrder,
}

/// Raw product form fields.
#[derive(Debug, Clone, Default)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub price: String,
    pub category_id: String,
    pub image_url: String,
    pub featured: bool,
    pub in_stock: bool,
}

/// Raw category form fields.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct CategoryForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sort_order: String,
    /// Checkbox: present when ticked.
    pub active: Option<String>,
}

/// Validate a product form against the current category list.
///
/// The returned input has no image; the caller decides that separately.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found.
pub fn validate_product(
    form: &ProductForm,
    categories: &[Category],
) -> Result<ProductInput, ValidationError> {
    let name = validate_name(&form.name, MAX_PRODUCT_NAME)?;
    let description = validate_description(&form.description)?;
    let price = parse_price(&form.price)?;

    let category_id = form
        .category_id
        .trim()
        .parse::<i32>()
        .map(CategoryId::new)
        .map_err(|_| ValidationError::UnknownCategory)?;
    if !categories.iter().any(|c| c.id == category_id) {
        return Err(ValidationError::UnknownCategory);
    }

    Ok(ProductInput {
        category_id,
        name,
        description,
        price,
        image_url: None,
        featured: form.featured,
        in_stock: form.in_stock,
    })
}

/// Validate a category form. Name uniqueness is enforced by the database.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found.
pub fn validate_category(form: &CategoryForm) -> Result<CategoryInput, ValidationError> {
    let name = validate_name(&form.name, MAX_CATEGORY_NAME)?;
    let description = validate_description(&form.description)?;
    let sort_order = match form.sort_order.trim() {
        "" => 0,
        s => s.parse().map_err(|_| ValidationError::InvalidSortOrder)?,
    };

    Ok(CategoryInput {
        name,
        description,
        active: form.active.is_some(),
        sort_order,
    })
}

/// Parse a price such as `12.5`, `12.50` or `$12.50`.
///
/// # Errors
///
/// Returns a [`ValidationError`] for non-numbers, negatives, fractions of
/// a cent, and implausibly large prices.
pub fn parse_price(raw: &str) -> Result<Money, ValidationError> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('$').unwrap_or(trimmed).trim();
    let amount = Decimal::from_str(trimmed).map_err(|_| ValidationError::InvalidPrice)?;

    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(ValidationError::NegativePrice);
    }
    if amount.normalize().scale() > 2 {
        return Err(ValidationError::TooManyDecimals);
    }
    let price = Money::from_decimal(amount);
    if price > Money::from_cents(MAX_PRICE_CENTS) {
        return Err(ValidationError::PriceTooHigh);
    }
    Ok(price)
}

/// Validate an optional image URL field. Blank means no URL.
///
/// # Errors
///
/// Returns `ValidationError::InvalidImageUrl` for anything that is not an
/// absolute http(s) URL or a site-relative path, and
/// `ValidationError::StoredImageUrl` for a path under the media directory.
pub fn validate_image_url(raw: &str) -> Result<Option<String>, ValidationError> {
    let url = raw.trim();
    if url.is_empty() {
        return Ok(None);
    }
    let allowed = url.starts_with("https://")
        || url.starts_with("http://")
        || (url.starts_with('/') && !url.starts_with("//"));
    if !allowed || url.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidImageUrl);
    }
    // Stored uploads belong to one product and are deleted along with it
    if url.starts_with(MEDIA_URL_PREFIX) {
        return Err(ValidationError::StoredImageUrl);
    }
    Ok(Some(url.to_owned()))
}

fn validate_name(raw: &str, max: usize) -> Result<String, ValidationError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValidationError::NameRequired);
    }
    if name.chars().count() > max {
        return Err(ValidationError::NameTooLong { max });
    }
    Ok(name.to_owned())
}

fn validate_description(raw: &str) -> Result<String, ValidationError> {
    let description = raw.trim();
    if description.chars().count() > MAX_DESCRIPTION {
        return Err(ValidationError::DescriptionTooLong {
            max: MAX_DESCRIPTION,
        });
    }
    Ok(description.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn categories() -> Vec<Category> {
        vec![Category {
            id: CategoryId::new(3),
            name: "Pasta".to_string(),
            description: String::new(),
            active: true,
            sort_order: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }]
    }

    fn product_form() -> ProductForm {
        ProductForm {
            name: "  Cacio e pepe ".to_string(),
            description: "Pecorino, black pepper".to_string(),
            price: "14.5".to_string(),
            category_id: "3".to_string(),
            image_url: String::new(),
            featured: true,
            in_stock: true,
        }
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("12.50").unwrap(), Money::from_cents(1250));
        assert_eq!(parse_price(" $9 ").unwrap(), Money::from_cents(900));
        assert_eq!(parse_price("0").unwrap(), Money::ZERO);
        assert_eq!(parse_price("4.500").unwrap(), Money::from_cents(450));
        assert_eq!(parse_price("4.505"), Err(ValidationError::TooManyDecimals));
        assert_eq!(parse_price("-1"), Err(ValidationError::NegativePrice));
        assert_eq!(parse_price("abc"), Err(ValidationError::InvalidPrice));
        assert_eq!(parse_price(""), Err(ValidationError::InvalidPrice));
        assert_eq!(parse_price("1000.01"), Err(ValidationError::PriceTooHigh));
    }

    #[test]
    fn test_validate_product() {
        let input = validate_product(&product_form(), &categories()).unwrap();
        assert_eq!(input.name, "Cacio e pepe");
        assert_eq!(input.price, Money::from_cents(1450));
        assert_eq!(input.category_id, CategoryId::new(3));
        assert!(input.featured);
        assert_eq!(input.image_url, None);
    }

    #[test]
    fn test_validate_product_rejects_bad_fields() {
        let form = ProductForm {
            name: "x".repeat(121),
            ..product_form()
        };
        assert_eq!(
            validate_product(&form, &categories()),
            Err(ValidationError::NameTooLong { max: 120 })
        );

        let form = ProductForm {
            name: " ".to_string(),
            ..product_form()
        };
        assert_eq!(
            validate_product(&form, &categories()),
            Err(ValidationError::NameRequired)
        );

        let form = ProductForm {
            category_id: "99".to_string(),
            ..product_form()
        };
        assert_eq!(
            validate_product(&form, &categories()),
            Err(ValidationError::UnknownCategory)
        );
    }

    #[test]
    fn test_name_length_counts_characters() {
        let form = ProductForm {
            name: "é".repeat(120),
            ..product_form()
        };
        assert!(validate_product(&form, &categories()).is_ok());
    }

    #[test]
    fn test_validate_image_url() {
        assert_eq!(validate_image_url("  ").unwrap(), None);
        assert_eq!(
            validate_image_url("https://cdn.example.com/a.jpg").unwrap(),
            Some("https://cdn.example.com/a.jpg".to_string())
        );
        assert!(validate_image_url("/static/img/tiramisu.jpg").is_ok());
        assert!(validate_image_url("//evil.example.com/a.jpg").is_err());
        assert!(validate_image_url("javascript:alert(1)").is_err());
        assert_eq!(
            validate_image_url("/media/products/5f0c2a.png"),
            Err(ValidationError::StoredImageUrl)
        );
    }

    #[test]
    fn test_validate_category() {
        let form = CategoryForm {
            name: "Antipasti".to_string(),
            description: String::new(),
            sort_order: " 2 ".to_string(),
            active: Some("on".to_string()),
        };
        let input = validate_category(&form).unwrap();
        assert_eq!(input.sort_order, 2);
        assert!(input.active);

        let form = CategoryForm {
            sort_order: "first".to_string(),
            ..form
        };
        assert_eq!(
            validate_category(&form),
            Err(ValidationError::InvalidSortOrder)
        );

        let form = CategoryForm {
            name: "x".repeat(81),
            ..CategoryForm::default()
        };
        assert_eq!(
            validate_category(&form),
            Err(ValidationError::NameTooLong { max: 80 })
        );
        assert!(!validate_category(&CategoryForm {
            name: "Dolci".to_string(),
            ..CategoryForm::default()
        })
        .unwrap()
        .active);
    }
}
