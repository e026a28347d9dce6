//! Product management with image handling.

use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use trattoria_core::{Product, ProductId};

use crate::db::products::ProductInput;
use crate::db::{ProductRepository, RepositoryError};
use crate::services::media::{MediaError, MediaStore};

/// What to do with a product's image on save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageChange {
    /// Leave the current image alone.
    Keep,
    /// Store these bytes and use the new URL.
    Upload(Vec<u8>),
    /// Point at an external or static URL.
    Url(String),
    /// Clear the image.
    Remove,
}

impl ImageChange {
    /// Decide from the form: an upload wins over a URL, which wins over the
    /// remove checkbox.
    #[must_use]
    pub fn from_form(upload: Option<Vec<u8>>, url: Option<String>, remove: bool) -> Self {
        match (upload.filter(|bytes| !bytes.is_empty()), url) {
            (Some(bytes), _) => Self::Upload(bytes),
            (None, Some(url)) => Self::Url(url),
            (None, None) if remove => Self::Remove,
            (None, None) => Self::Keep,
        }
    }
}

/// Errors from product operations.
#[derive(Debug, Error)]
pub enum ProductError {
    #[error("product not found")]
    NotFound,

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Creates, updates and deletes products, keeping stored images in step.
pub struct ProductService<'a, M: MediaStore> {
    products: ProductRepository<'a>,
    media: &'a M,
}

impl<'a, M: MediaStore> ProductService<'a, M> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, media: &'a M) -> Self {
        Self {
            products: ProductRepository::new(pool),
            media,
        }
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::Media` if the upload is rejected. A stored
    /// upload is removed again if the insert fails.
    #[instrument(skip(self, input, image), fields(name = %input.name))]
    pub async fn create(
        &self,
        mut input: ProductInput,
        image: ImageChange,
    ) -> Result<Product, ProductError> {
        let uploaded = self.apply_image(&mut input, image, None).await?;

        match self.products.create(&input).await {
            Ok(product) => {
                tracing::info!(product_id = %product.id, "Product created");
                Ok(product)
            }
            Err(e) => {
                self.discard(uploaded.as_deref()).await;
                Err(e.into())
            }
        }
    }

    /// Update a product. The previous stored image is removed when it is
    /// replaced or cleared.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::NotFound` if the product does not exist.
    #[instrument(skip(self, input, image), fields(name = %input.name))]
    pub async fn update(
        &self,
        id: ProductId,
        mut input: ProductInput,
        image: ImageChange,
    ) -> Result<Product, ProductError> {
        let existing = self.products.get(id).await?.ok_or(ProductError::NotFound)?;
        let uploaded = self
            .apply_image(&mut input, image, existing.image_url.clone())
            .await?;

        let product = match self.products.update(id, &input).await {
            Ok(product) => product,
            Err(e) => {
                self.discard(uploaded.as_deref()).await;
                return Err(match e {
                    RepositoryError::NotFound => ProductError::NotFound,
                    other => other.into(),
                });
            }
        };

        if existing.image_url != product.image_url {
            self.discard(existing.image_url.as_deref()).await;
        }
        tracing::info!(product_id = %product.id, "Product updated");
        Ok(product)
    }

    /// Delete a product and its stored image.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::NotFound` if the product does not exist.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: ProductId) -> Result<(), ProductError> {
        let product = self.products.delete(id).await.map_err(|e| match e {
            RepositoryError::NotFound => ProductError::NotFound,
            other => other.into(),
        })?;
        self.discard(product.image_url.as_deref()).await;
        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }

    /// Resolve `image` into `input.image_url`. Returns the URL of a fresh
    /// upload so it can be cleaned up if the database write fails.
    async fn apply_image(
        &self,
        input: &mut ProductInput,
        image: ImageChange,
        current: Option<String>,
    ) -> Result<Option<String>, ProductError> {
        match image {
            ImageChange::Keep => {
                input.image_url = current;
                Ok(None)
            }
            ImageChange::Upload(bytes) => {
                let url = self.media.put(&bytes).await?;
                input.image_url = Some(url.clone());
                Ok(Some(url))
            }
            ImageChange::Url(url) => {
                input.image_url = Some(url);
                Ok(None)
            }
            ImageChange::Remove => {
                input.image_url = None;
                Ok(None)
            }
        }
    }

    /// Remove a stored image, logging rather than failing.
    async fn discard(&self, url: Option<&str>) {
        if let Some(url) = url
            && let Err(e) = self.media.delete(url).await
        {
            tracing::warn!(url = %url, error = %e, "Failed to remove product image");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_change_from_form() {
        assert_eq!(
            ImageChange::from_form(Some(vec![1, 2]), Some("/a.png".into()), true),
            ImageChange::Upload(vec![1, 2])
        );
        assert_eq!(
            ImageChange::from_form(Some(Vec::new()), Some("/a.png".into()), false),
            ImageChange::Url("/a.png".into())
        );
        assert_eq!(
            ImageChange::from_form(None, None, true),
            ImageChange::Remove
        );
        assert_eq!(ImageChange::from_form(None, None, false), ImageChange::Keep);
    }
}
