//! Record store port (driven/secondary port)
//!
//! This module defines the interface the sync pipeline uses for reading
//! the crawl catalog and persisting mileage car records. The interface is
//! deliberately narrow: the pipeline only ever lists the catalog, checks
//! one listing id, and inserts one record. Catalog maintenance lives on
//! the concrete adapter, not here.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because storage errors are adapter-specific
//!   (SQLite, filesystem, etc.) and don't need domain-level classification.
//! - `find_by_listing_id` + `insert_record` form a check-then-insert pair;
//!   implementations must also enforce listing-id uniqueness themselves so
//!   a race cannot produce two records for one listing.

use crate::domain::catalog::CatalogEntry;
use crate::domain::newtypes::{ListingId, RecordId};
use crate::domain::record::MileageCarRecord;

/// Port trait for catalog reads and record persistence
#[async_trait::async_trait]
pub trait IRecordStore: Send + Sync {
    /// Lists every catalog entry, crawlable or not, in insertion order
    async fn list_catalog_entries(&self) -> anyhow::Result<Vec<CatalogEntry>>;

    /// Looks up a persisted record by its external listing id
    async fn find_by_listing_id(&self, id: &ListingId)
        -> anyhow::Result<Option<MileageCarRecord>>;

    /// Persists a new record, returning its id
    ///
    /// Fails if a record with the same external listing id already exists.
    async fn insert_record(&self, record: &MileageCarRecord) -> anyhow::Result<RecordId>;
}
