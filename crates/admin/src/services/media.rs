//! Product image storage.
//!
//! Images are sniffed by their leading bytes; the client-supplied filename
//! and content type are never trusted.

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

/// Largest accepted upload.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// URL prefix under which [`LocalMediaStore`] files are served.
pub const MEDIA_URL_PREFIX: &str = "/media/";

const PRODUCT_DIR: &str = "products";

/// Errors from storing or removing media.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("unsupported image type (use JPEG, PNG, WebP or GIF)")]
    UnsupportedType,

    #[error("image is larger than {} MiB", max / (1024 * 1024))]
    TooLarge { max: usize },

    #[error("image is empty")]
    Empty,

    #[error("media storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where product images live.
pub trait MediaStore: Send + Sync {
    /// Store an image and return its public URL.
    fn put(&self, data: &[u8]) -> impl Future<Output = Result<String, MediaError>> + Send;

    /// Remove a previously stored image by its public URL.
    ///
    /// URLs this store did not issue are ignored, as are files that are
    /// already gone.
    fn delete(&self, url: &str) -> impl Future<Output = Result<(), MediaError>> + Send;

    /// Public URL for a storage key.
    fn public_url(&self, key: &str) -> String;
}

/// Recognised image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Webp,
    Gif,
}

impl ImageKind {
    /// Detect the format from the file's magic bytes.
    #[must_use]
    pub fn sniff(data: &[u8]) -> Option<Self> {
        match data {
            [0xFF, 0xD8, 0xFF, ..] => Some(Self::Jpeg),
            [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some(Self::Png),
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some(Self::Webp),
            [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => Some(Self::Gif),
            _ => None,
        }
    }

    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Gif => "gif",
        }
    }
}

/// Check size and format before anything touches the disk.
///
/// # Errors
///
/// Returns `MediaError::Empty`, `TooLarge`, or `UnsupportedType`.
pub fn check_image(data: &[u8]) -> Result<ImageKind, MediaError> {
    if data.is_empty() {
        return Err(MediaError::Empty);
    }
    if data.len() > MAX_IMAGE_BYTES {
        return Err(MediaError::TooLarge {
            max: MAX_IMAGE_BYTES,
        });
    }
    ImageKind::sniff(data).ok_or(MediaError::UnsupportedType)
}

/// Media store backed by a local directory, served by `ServeDir` at
/// `/media`.
#[derive(Debug, Clone)]
pub struct LocalMediaStore {
    root: PathBuf,
}

impl LocalMediaStore {
    /// Create a store rooted at `root`. Directories are created on first
    /// write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory files are written under.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a public URL back to a file path, if this store issued it.
    fn path_for_url(&self, url: &str) -> Option<PathBuf> {
        let key = url.strip_prefix(MEDIA_URL_PREFIX)?;
        let file_name = key.strip_prefix(PRODUCT_DIR)?.strip_prefix('/')?;
        let safe = !file_name.is_empty()
            && file_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
            && !file_name.starts_with('.');
        safe.then(|| self.root.join(PRODUCT_DIR).join(file_name))
    }
}

impl MediaStore for LocalMediaStore {
    #[instrument(skip(self, data), fields(bytes = data.len()))]
    async fn put(&self, data: &[u8]) -> Result<String, MediaError> {
        let kind = check_image(data)?;

        let dir = self.root.join(PRODUCT_DIR);
        tokio::fs::create_dir_all(&dir).await?;

        let file_name = format!("{}.{}", Uuid::new_v4(), kind.extension());
        tokio::fs::write(dir.join(&file_name), data).await?;

        let url = self.public_url(&format!("{PRODUCT_DIR}/{file_name}"));
        tracing::info!(url = %url, "Stored product image");
        Ok(url)
    }

    #[instrument(skip(self))]
    async fn delete(&self, url: &str) -> Result<(), MediaError> {
        let Some(path) = self.path_for_url(url) else {
            return Ok(());
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(url = %url, "Removed product image");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{MEDIA_URL_PREFIX}{key}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    fn temp_store() -> LocalMediaStore {
        LocalMediaStore::new(std::env::temp_dir().join(format!("trattoria-media-{}", Uuid::new_v4())))
    }

    #[test]
    fn test_sniff_formats() {
        assert_eq!(ImageKind::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::sniff(PNG), Some(ImageKind::Png));
        assert_eq!(ImageKind::sniff(b"RIFF\0\0\0\0WEBPVP8 "), Some(ImageKind::Webp));
        assert_eq!(ImageKind::sniff(b"GIF89a"), Some(ImageKind::Gif));
        assert_eq!(ImageKind::sniff(b"<svg></svg>"), None);
        assert_eq!(ImageKind::sniff(b"RIFF\0\0\0\0WAVE"), None);
    }

    #[test]
    fn test_check_image_limits() {
        assert!(matches!(check_image(&[]), Err(MediaError::Empty)));
        assert!(matches!(
            check_image(b"%PDF-1.7"),
            Err(MediaError::UnsupportedType)
        ));
        let mut big = PNG.to_vec();
        big.resize(MAX_IMAGE_BYTES + 1, 0);
        assert!(matches!(check_image(&big), Err(MediaError::TooLarge { .. })));
    }

    #[test]
    fn test_path_for_url_rejects_foreign_urls() {
        let store = LocalMediaStore::new("/srv/media");
        assert_eq!(
            store.path_for_url("/media/products/abc-123.png"),
            Some(PathBuf::from("/srv/media/products/abc-123.png"))
        );
        assert_eq!(store.path_for_url("https://cdn.example.com/a.png"), None);
        assert_eq!(store.path_for_url("/media/products/../../etc/passwd"), None);
        assert_eq!(store.path_for_url("/media/products/"), None);
        assert_eq!(store.path_for_url("/media/other/a.png"), None);
    }

    #[tokio::test]
    async fn test_put_then_delete() {
        let store = temp_store();
        let url = store.put(PNG).await.unwrap();
        assert!(url.starts_with("/media/products/"));
        assert!(url.ends_with(".png"));

        let path = store.path_for_url(&url).unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), PNG);

        store.delete(&url).await.unwrap();
        assert!(!path.exists());
        // Deleting again is a no-op.
        store.delete(&url).await.unwrap();

        let _ = tokio::fs::remove_dir_all(store.root()).await;
    }
}
