//! Filesystem photo importer (secondary/driven adapter)
//!
//! Implements [`IPhotoImporter`] by downloading each photo over HTTP and
//! writing the bytes under the configured storage directory.
//!
//! ## Design Decisions
//!
//! - **Best effort per URL**: a failed download or write skips that one
//!   photo with a warning; the remaining photos still get stored. Only an
//!   unusable storage directory fails the whole import.
//! - **Stable filenames**: `{slug}-{photo id}.{ext}` ties every stored
//!   file back to its listing context while the fresh id keeps names
//!   collision-free.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use reqwest::Client;
use tracing::{debug, instrument, warn};

use avsync_core::domain::newtypes::PhotoId;
use avsync_core::ports::{IPhotoImporter, PhotoNamingContext};

/// Adapter that re-hosts marketplace photos on the local filesystem
pub struct FilePhotoImporter {
    /// HTTP client for CDN downloads
    client: Client,
    /// Directory the photo files are written into
    storage_dir: PathBuf,
}

impl FilePhotoImporter {
    /// Creates a new importer writing into the given directory
    ///
    /// The directory is created lazily on the first import, not here, so
    /// constructing an importer for a sync pass without `--with-photos`
    /// touches nothing on disk.
    ///
    /// # Arguments
    /// * `timeout` - Per-request timeout applied to every download
    /// * `storage_dir` - Target directory for stored photo files
    pub fn new(timeout: Duration, storage_dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            storage_dir: storage_dir.into(),
        })
    }

    /// Returns the storage directory photos are written into
    pub fn storage_dir(&self) -> &PathBuf {
        &self.storage_dir
    }

    /// Downloads one photo, returning its raw bytes
    async fn download(&self, url: &str) -> anyhow::Result<Vec<u8>> {
        let bytes = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to request photo {}", url))?
            .error_for_status()
            .with_context(|| format!("Photo request {} returned error status", url))?
            .bytes()
            .await
            .with_context(|| format!("Failed to read photo body from {}", url))?;

        Ok(bytes.to_vec())
    }

    /// Writes one photo file, returning the id embedded in its name
    async fn store_photo(&self, slug: &str, url: &str, bytes: &[u8]) -> anyhow::Result<PhotoId> {
        let id = PhotoId::new();
        let filename = format!("{}-{}.{}", slug, id, extension_from_url(url));
        let path = self.storage_dir.join(filename);

        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write photo file {}", path.display()))?;

        debug!(path = %path.display(), bytes = bytes.len(), "Stored photo");
        Ok(id)
    }
}

/// File extension taken from the URL path, defaulting to jpg
///
/// Query strings and fragments are ignored; anything that does not look
/// like a short alphanumeric extension falls back to jpg.
fn extension_from_url(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    match path.rsplit_once('.') {
        Some((_, ext))
            if !ext.is_empty()
                && ext.len() <= 4
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext
        }
        _ => "jpg",
    }
}

#[async_trait::async_trait]
impl IPhotoImporter for FilePhotoImporter {
    #[instrument(skip(self, context, urls), fields(subject = %context.slug(), count = urls.len()))]
    async fn import_photos(
        &self,
        context: &PhotoNamingContext,
        urls: &[String],
    ) -> anyhow::Result<Vec<PhotoId>> {
        tokio::fs::create_dir_all(&self.storage_dir)
            .await
            .with_context(|| {
                format!(
                    "Failed to create photo storage directory {}",
                    self.storage_dir.display()
                )
            })?;

        let slug = context.slug();
        let mut ids = Vec::with_capacity(urls.len());

        for url in urls {
            let bytes = match self.download(url).await {
                Ok(bytes) => bytes,
                Err(err) => {
                    warn!(url = %url, error = %err, "Skipping failed photo download");
                    continue;
                }
            };

            match self.store_photo(&slug, url, &bytes).await {
                Ok(id) => ids.push(id),
                Err(err) => warn!(url = %url, error = %err, "Skipping failed photo write"),
            }
        }

        debug!(
            stored = ids.len(),
            requested = urls.len(),
            "Photo import finished"
        );
        Ok(ids)
    }
}
