//! The persisted mileage car record
//!
//! A [`MileageCarRecord`] is created exactly once per new last-sold
//! listing and is never updated or deleted by the sync pipeline. It ties
//! the local catalog relation (brand/model UUIDs) to the marketplace
//! coordinates that produced the listing (external brand/model/generation
//! ids and the listing id itself), and carries the listing's descriptive
//! fields and photo data.
//!
//! ## Design Notes
//!
//! - Construction goes through [`MileageCarRecord::compose`], which takes
//!   the traversal inputs as one tagged [`RecordSource`] and validates that
//!   the entry is actually crawlable. There is no field-by-field mutation
//!   path; a record is immutable once composed.
//! - Raw photo URLs are always retained, even when no photos were
//!   imported, so a later backfill can re-fetch them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::catalog::CatalogEntry;
use super::errors::DomainError;
use super::generation::Generation;
use super::listing::{LastSoldListing, ListingProperty};
use super::newtypes::{
    BrandId, ExternalBrandId, ExternalGenerationId, ExternalModelId, ListingId, ModelId, PhotoId,
    RecordId,
};

/// A locally persisted last-sold car
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MileageCarRecord {
    /// Local record identifier
    pub id: RecordId,
    /// Owning local brand
    pub brand_id: BrandId,
    /// Owning local model
    pub model_id: ModelId,
    /// Marketplace brand id the listing was found under
    pub external_brand: ExternalBrandId,
    /// Marketplace model id the listing was found under
    pub external_model: ExternalModelId,
    /// Marketplace generation id the listing was found under
    pub external_generation: ExternalGenerationId,
    /// Generation display name at ingestion time
    pub generation_name: String,
    /// Model year the listing was queried for
    pub year: i32,
    /// External listing id, unique across all records
    pub external_listing: ListingId,
    /// Descriptive fields copied from the listing
    pub properties: Vec<ListingProperty>,
    /// Identifiers of the re-hosted photo copies, empty unless imported
    pub photo_ids: Vec<PhotoId>,
    /// Raw marketplace photo URLs
    pub photo_urls: Vec<String>,
    /// Ingestion timestamp
    pub created_at: DateTime<Utc>,
}

/// The tagged set of inputs a record is composed from
///
/// One instance corresponds to one (entry, generation, year, listing)
/// traversal position plus whatever photo import produced for it.
#[derive(Debug)]
pub struct RecordSource<'a> {
    /// The catalog entry being traversed
    pub entry: &'a CatalogEntry,
    /// The generation the listing was found under
    pub generation: &'a Generation,
    /// The queried model year
    pub year: i32,
    /// The new listing itself
    pub listing: &'a LastSoldListing,
    /// Stored-photo ids, empty when import was skipped or failed
    pub photo_ids: Vec<PhotoId>,
}

impl MileageCarRecord {
    /// Compose a new record from one traversal position
    ///
    /// # Errors
    /// Returns `DomainError::EntryNotCrawlable` if the entry lacks
    /// marketplace identifiers; the traversal filters such entries out, so
    /// hitting this from the engine indicates a bug in the caller.
    pub fn compose(source: RecordSource<'_>) -> Result<Self, DomainError> {
        let (external_brand, external_model) = source.entry.marketplace_ids().ok_or_else(|| {
            DomainError::EntryNotCrawlable {
                brand: source.entry.brand_name.clone(),
                model: source.entry.model_name.clone(),
            }
        })?;

        Ok(Self {
            id: RecordId::new(),
            brand_id: source.entry.brand_id,
            model_id: source.entry.model_id,
            external_brand,
            external_model,
            external_generation: source.generation.id,
            generation_name: source.generation.name.clone(),
            year: source.year,
            external_listing: source.listing.external_id.clone(),
            properties: source.listing.properties.clone(),
            photo_ids: source.photo_ids,
            photo_urls: source.listing.photo_urls.clone(),
            created_at: Utc::now(),
        })
    }
}
