//! Photo importer port (driven/secondary port)
//!
//! This module defines the interface for re-hosting listing photos.
//! Photo import is strictly best effort: the pipeline creates the record
//! whether or not any photo could be stored.
//!
//! ## Design Notes
//!
//! - Implementations handle per-URL failures themselves and return the
//!   ids that did succeed; `Err` is reserved for the import target being
//!   unusable as a whole (e.g. the storage directory cannot be created).
//! - [`PhotoNamingContext`] carries whatever descriptive parts the listing
//!   had. Brand and model names come from listing properties and may be
//!   absent; `slug()` works with whatever is present.

use crate::domain::newtypes::PhotoId;

// ============================================================================
// Naming context
// ============================================================================

/// Descriptive context for naming stored photo files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoNamingContext {
    /// Brand name from listing properties, if present
    pub brand_name: Option<String>,
    /// Model name from listing properties, if present
    pub model_name: Option<String>,
    /// Generation display name
    pub generation_name: String,
    /// Model year the listing was queried for
    pub year: i32,
}

impl PhotoNamingContext {
    /// Derives a filename-safe label from the parts that are present
    ///
    /// Alphanumeric characters are lowercased, everything else collapses
    /// into single dashes. Missing brand/model parts are simply left out.
    #[must_use]
    pub fn slug(&self) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(4);
        if let Some(brand) = self.brand_name.as_deref() {
            parts.push(brand);
        }
        if let Some(model) = self.model_name.as_deref() {
            parts.push(model);
        }
        parts.push(&self.generation_name);
        let year = self.year.to_string();
        parts.push(&year);

        let raw = parts.join(" ");
        let mut slug = String::with_capacity(raw.len());
        let mut last_dash = true;
        for ch in raw.chars() {
            if ch.is_alphanumeric() {
                for lower in ch.to_lowercase() {
                    slug.push(lower);
                }
                last_dash = false;
            } else if !last_dash {
                slug.push('-');
                last_dash = true;
            }
        }
        while slug.ends_with('-') {
            slug.pop();
        }
        slug
    }
}

// ============================================================================
// Port trait
// ============================================================================

/// Port trait for re-hosting listing photos
#[async_trait::async_trait]
pub trait IPhotoImporter: Send + Sync {
    /// Imports the photos at the given URLs, returning ids of stored copies
    ///
    /// Partial success is expected: URLs that fail to download are skipped
    /// and the remaining ids are returned.
    async fn import_photos(
        &self,
        context: &PhotoNamingContext,
        urls: &[String],
    ) -> anyhow::Result<Vec<PhotoId>>;
}
