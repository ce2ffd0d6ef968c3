//! Catalog crawl engine
//!
//! The [`SyncEngine`] runs one full crawl of the local catalog against
//! the marketplace: every crawlable (brand, model) entry is expanded into
//! its generations, every generation into its model years, and every
//! (generation, year) pair is queried for last-sold listings. Listings
//! with an unknown id become persisted records; known ids are skipped.
//!
//! ## Traversal
//!
//! 1. **Catalog**: load all entries, skip those without marketplace ids
//! 2. **Generations**: fetch per entry; undated generations are skipped
//! 3. **Years**: enumerate the generation's model years, capping
//!    open-ended generations at the current calendar year
//! 4. **Listings**: fetch last-sold listings per year, dedupe by listing
//!    id, import photos when requested, persist the rest
//!
//! ## Failure Isolation
//!
//! A failure anywhere in the traversal is captured as a [`SyncIssue`] on
//! the report and the traversal continues with the next sibling. [`run`]
//! itself never fails: even a catalog that cannot be loaded produces a
//! report, not an error.
//!
//! [`SyncIssue`]: avsync_core::domain::report::SyncIssue
//! [`run`]: SyncEngine::run

use std::sync::Arc;

use chrono::{Datelike, Utc};
use tracing::{debug, error, info, warn};

use avsync_core::domain::catalog::CatalogEntry;
use avsync_core::domain::generation::Generation;
use avsync_core::domain::listing::LastSoldListing;
use avsync_core::domain::newtypes::{ExternalBrandId, ExternalModelId};
use avsync_core::domain::record::{MileageCarRecord, RecordSource};
use avsync_core::domain::report::{SyncReport, SyncStage};
use avsync_core::ports::marketplace_provider::IMarketplaceProvider;
use avsync_core::ports::photo_importer::{IPhotoImporter, PhotoNamingContext};
use avsync_core::ports::record_store::IRecordStore;

// ============================================================================
// SyncEngine
// ============================================================================

/// One-pass catalog crawl orchestrator
///
/// Walks the catalog sequentially, entry by entry, and ingests every
/// last-sold listing it has not seen before. The listing id is the sole
/// dedupe key, so repeated runs against the same marketplace state are
/// idempotent.
///
/// ## Dependencies
///
/// - `marketplace`: generation and last-sold listing queries
/// - `store`: catalog reads and record persistence
/// - `photos`: best-effort re-hosting of listing photos
pub struct SyncEngine {
    /// Remote marketplace queries
    marketplace: Arc<dyn IMarketplaceProvider>,
    /// Catalog reads and record persistence
    store: Arc<dyn IRecordStore>,
    /// Best-effort photo re-hosting
    photos: Arc<dyn IPhotoImporter>,
}

impl SyncEngine {
    /// Creates a new `SyncEngine` with the given port implementations
    pub fn new(
        marketplace: Arc<dyn IMarketplaceProvider>,
        store: Arc<dyn IRecordStore>,
        photos: Arc<dyn IPhotoImporter>,
    ) -> Self {
        Self {
            marketplace,
            store,
            photos,
        }
    }

    // ========================================================================
    // Full pass
    // ========================================================================

    /// Runs one full crawl pass over the catalog
    ///
    /// 1. Loads all catalog entries from the store
    /// 2. Skips entries without marketplace ids (counted, not reported)
    /// 3. Processes each remaining entry independently
    /// 4. Logs a completion line and returns the report
    ///
    /// Never returns an error: every failure, including a catalog that
    /// cannot be loaded at all, is captured on the report and the rest of
    /// the pass continues.
    #[tracing::instrument(skip(self))]
    pub async fn run(&self, with_photos: bool) -> SyncReport {
        let start = std::time::Instant::now();
        let mut report = SyncReport::new();

        let entries = match self.store.list_catalog_entries().await {
            Ok(entries) => entries,
            Err(err) => {
                error!(error = %render_chain(&err), "Failed to load catalog");
                report.record_issue(SyncStage::CatalogLoad, "catalog", render_chain(&err));
                report.duration_ms = start.elapsed().as_millis() as u64;
                return report;
            }
        };

        info!(entries = entries.len(), "Starting sync pass");

        for entry in &entries {
            let Some((brand, model)) = entry.marketplace_ids() else {
                debug!(entry = %entry.label(), "Skipping entry without marketplace ids");
                report.entries_skipped += 1;
                continue;
            };

            self.process_entry(entry, brand, model, with_photos, &mut report)
                .await;
            report.entries_processed += 1;
        }

        report.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            entries = report.entries_processed,
            skipped = report.entries_skipped,
            years = report.years_queried,
            listings = report.listings_seen,
            created = report.records_created,
            duplicates = report.duplicates_skipped,
            photos = report.photos_imported,
            issues = report.issues.len(),
            duration_ms = report.duration_ms,
            "Sync pass completed"
        );

        report
    }

    // ========================================================================
    // Entry traversal
    // ========================================================================

    /// Crawls one catalog entry: fetches its generations and walks each one
    #[tracing::instrument(skip_all, fields(entry = %entry.label()))]
    async fn process_entry(
        &self,
        entry: &CatalogEntry,
        brand: ExternalBrandId,
        model: ExternalModelId,
        with_photos: bool,
        report: &mut SyncReport,
    ) {
        let generations = match self.marketplace.list_generations(brand, model).await {
            Ok(generations) => generations,
            Err(err) => {
                warn!(error = %render_chain(&err), "Failed to fetch generations");
                report.record_issue(SyncStage::GenerationFetch, entry.label(), render_chain(&err));
                return;
            }
        };

        debug!(generations = generations.len(), "Generations fetched");

        for generation in &generations {
            self.process_generation(entry, brand, model, generation, with_photos, report)
                .await;
        }
    }

    /// Enumerates one generation's model years and queries each of them
    ///
    /// Undated generations (no `year_from`) cannot be enumerated and are
    /// skipped without an issue.
    async fn process_generation(
        &self,
        entry: &CatalogEntry,
        brand: ExternalBrandId,
        model: ExternalModelId,
        generation: &Generation,
        with_photos: bool,
        report: &mut SyncReport,
    ) {
        // Evaluated per generation: a long pass can straddle New Year's Eve.
        let current_year = Utc::now().year();
        let Some(years) = generation.model_years(current_year) else {
            debug!(generation = %generation.id, "Skipping undated generation");
            return;
        };

        for year in years {
            self.process_year(entry, brand, model, generation, year, with_photos, report)
                .await;
        }
    }

    /// Queries the last-sold listings of one (generation, year) pair and
    /// ingests each of them sequentially
    #[tracing::instrument(skip_all, fields(generation = %generation.id, year = year))]
    async fn process_year(
        &self,
        entry: &CatalogEntry,
        brand: ExternalBrandId,
        model: ExternalModelId,
        generation: &Generation,
        year: i32,
        with_photos: bool,
        report: &mut SyncReport,
    ) {
        report.years_queried += 1;

        let listings = match self
            .marketplace
            .list_last_sold(brand, model, generation.id, year)
            .await
        {
            Ok(listings) => listings,
            Err(err) => {
                let subject = format!("{} gen {} year {}", entry.label(), generation.id, year);
                warn!(error = %render_chain(&err), "Failed to fetch last-sold listings");
                report.record_issue(SyncStage::ListingFetch, subject, render_chain(&err));
                return;
            }
        };

        report.listings_seen += listings.len() as u32;

        for listing in &listings {
            self.ingest_listing(entry, generation, year, listing, with_photos, report)
                .await;
        }
    }

    // ========================================================================
    // Listing ingestion
    // ========================================================================

    /// Ingests one last-sold listing
    ///
    /// Checks the listing id against the store first and short-circuits if
    /// it is already known. For new listings, photos are imported when
    /// requested (best effort: an import failure leaves the record without
    /// stored photo ids), then the record is composed and persisted.
    #[tracing::instrument(skip_all, fields(listing = %listing.external_id))]
    async fn ingest_listing(
        &self,
        entry: &CatalogEntry,
        generation: &Generation,
        year: i32,
        listing: &LastSoldListing,
        with_photos: bool,
        report: &mut SyncReport,
    ) {
        let subject = format!(
            "{} gen {} year {} listing {}",
            entry.label(),
            generation.id,
            year,
            listing.external_id
        );

        match self.store.find_by_listing_id(&listing.external_id).await {
            Ok(Some(_)) => {
                debug!("Listing already ingested, skipping");
                report.duplicates_skipped += 1;
                return;
            }
            Ok(None) => {}
            Err(err) => {
                warn!(error = %render_chain(&err), "Dedupe lookup failed");
                report.record_issue(SyncStage::DedupeLookup, subject, render_chain(&err));
                return;
            }
        }

        let photo_ids = if with_photos {
            let context = PhotoNamingContext {
                brand_name: listing.brand_name().map(str::to_string),
                model_name: listing.model_name().map(str::to_string),
                generation_name: generation.name.clone(),
                year,
            };
            match self.photos.import_photos(&context, &listing.photo_urls).await {
                Ok(ids) => {
                    report.photos_imported += ids.len() as u32;
                    ids
                }
                Err(err) => {
                    warn!(error = %render_chain(&err), "Photo import failed");
                    report.record_issue(SyncStage::PhotoImport, subject.clone(), render_chain(&err));
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let record = match MileageCarRecord::compose(RecordSource {
            entry,
            generation,
            year,
            listing,
            photo_ids,
        }) {
            Ok(record) => record,
            Err(err) => {
                warn!(error = %err, "Failed to compose record");
                report.record_issue(SyncStage::RecordInsert, subject, err);
                return;
            }
        };

        match self.store.insert_record(&record).await {
            Ok(id) => {
                debug!(record = %id, "Record created");
                report.records_created += 1;
            }
            Err(err) => {
                warn!(error = %render_chain(&err), "Failed to insert record");
                report.record_issue(SyncStage::RecordInsert, subject, render_chain(&err));
            }
        }
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Renders an error with its full source chain for issue capture
fn render_chain(err: &anyhow::Error) -> String {
    format!("{err:#}")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use avsync_core::domain::listing::ListingProperty;
    use avsync_core::domain::newtypes::{
        BrandId, ExternalGenerationId, ListingId, ModelId, PhotoId, RecordId,
    };

    // --- fixtures ---

    fn entry(brand_name: &str, model_name: &str, brand: u32, model: u32) -> CatalogEntry {
        CatalogEntry {
            brand_id: BrandId::new(),
            model_id: ModelId::new(),
            brand_name: brand_name.to_string(),
            model_name: model_name.to_string(),
            external_brand: Some(ExternalBrandId::new(brand).unwrap()),
            external_model: Some(ExternalModelId::new(model).unwrap()),
        }
    }

    fn unmapped_entry(brand_name: &str, model_name: &str) -> CatalogEntry {
        CatalogEntry {
            brand_id: BrandId::new(),
            model_id: ModelId::new(),
            brand_name: brand_name.to_string(),
            model_name: model_name.to_string(),
            external_brand: None,
            external_model: None,
        }
    }

    fn generation(
        id: u32,
        name: &str,
        year_from: Option<i32>,
        year_to: Option<i32>,
    ) -> Generation {
        Generation {
            id: ExternalGenerationId::new(id).unwrap(),
            name: name.to_string(),
            year_from,
            year_to,
        }
    }

    fn listing(id: &str) -> LastSoldListing {
        LastSoldListing {
            external_id: ListingId::new(id).unwrap(),
            properties: vec![
                ListingProperty {
                    name: "brand".to_string(),
                    value: "Audi".to_string(),
                },
                ListingProperty {
                    name: "model".to_string(),
                    value: "A4".to_string(),
                },
            ],
            photo_urls: vec![
                "https://cdn.example.com/1.jpg".to_string(),
                "https://cdn.example.com/2.jpg".to_string(),
            ],
        }
    }

    // --- mock marketplace ---

    type PriceKey = (u32, u32, u32, i32);

    /// Scripted marketplace that records every query it receives
    struct MockMarketplace {
        generations: HashMap<(u32, u32), Vec<Generation>>,
        listings: HashMap<PriceKey, Vec<LastSoldListing>>,
        broken_pairs: Vec<(u32, u32)>,
        broken_years: Vec<PriceKey>,
        generation_queries: Mutex<Vec<(u32, u32)>>,
        price_queries: Mutex<Vec<PriceKey>>,
    }

    impl MockMarketplace {
        fn new() -> Self {
            Self {
                generations: HashMap::new(),
                listings: HashMap::new(),
                broken_pairs: Vec::new(),
                broken_years: Vec::new(),
                generation_queries: Mutex::new(Vec::new()),
                price_queries: Mutex::new(Vec::new()),
            }
        }

        fn with_generations(mut self, brand: u32, model: u32, gens: Vec<Generation>) -> Self {
            self.generations.insert((brand, model), gens);
            self
        }

        fn with_listings(
            mut self,
            brand: u32,
            model: u32,
            generation: u32,
            year: i32,
            listings: Vec<LastSoldListing>,
        ) -> Self {
            self.listings.insert((brand, model, generation, year), listings);
            self
        }

        fn failing_for(mut self, brand: u32, model: u32) -> Self {
            self.broken_pairs.push((brand, model));
            self
        }

        fn failing_year(mut self, brand: u32, model: u32, generation: u32, year: i32) -> Self {
            self.broken_years.push((brand, model, generation, year));
            self
        }

        fn generation_queries(&self) -> Vec<(u32, u32)> {
            self.generation_queries.lock().unwrap().clone()
        }

        fn price_queries(&self) -> Vec<PriceKey> {
            self.price_queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl IMarketplaceProvider for MockMarketplace {
        async fn list_generations(
            &self,
            brand: ExternalBrandId,
            model: ExternalModelId,
        ) -> anyhow::Result<Vec<Generation>> {
            let key = (brand.get(), model.get());
            self.generation_queries.lock().unwrap().push(key);
            if self.broken_pairs.contains(&key) {
                anyhow::bail!("marketplace unavailable");
            }
            Ok(self.generations.get(&key).cloned().unwrap_or_default())
        }

        async fn list_last_sold(
            &self,
            brand: ExternalBrandId,
            model: ExternalModelId,
            generation: ExternalGenerationId,
            year: i32,
        ) -> anyhow::Result<Vec<LastSoldListing>> {
            let key = (brand.get(), model.get(), generation.get(), year);
            self.price_queries.lock().unwrap().push(key);
            if self.broken_years.contains(&key) {
                anyhow::bail!("price statistics unavailable");
            }
            Ok(self.listings.get(&key).cloned().unwrap_or_default())
        }
    }

    // --- in-memory store ---

    struct MemoryStore {
        entries: Vec<CatalogEntry>,
        records: Mutex<Vec<MileageCarRecord>>,
        fail_catalog: bool,
        fail_inserts: bool,
    }

    impl MemoryStore {
        fn new(entries: Vec<CatalogEntry>) -> Self {
            Self {
                entries,
                records: Mutex::new(Vec::new()),
                fail_catalog: false,
                fail_inserts: false,
            }
        }

        fn failing_catalog() -> Self {
            let mut store = Self::new(Vec::new());
            store.fail_catalog = true;
            store
        }

        fn failing_inserts(mut self) -> Self {
            self.fail_inserts = true;
            self
        }

        fn with_record(self, record: MileageCarRecord) -> Self {
            self.records.lock().unwrap().push(record);
            self
        }

        fn records(&self) -> Vec<MileageCarRecord> {
            self.records.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl IRecordStore for MemoryStore {
        async fn list_catalog_entries(&self) -> anyhow::Result<Vec<CatalogEntry>> {
            if self.fail_catalog {
                anyhow::bail!("database locked");
            }
            Ok(self.entries.clone())
        }

        async fn find_by_listing_id(
            &self,
            id: &ListingId,
        ) -> anyhow::Result<Option<MileageCarRecord>> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .iter()
                .find(|r| &r.external_listing == id)
                .cloned())
        }

        async fn insert_record(&self, record: &MileageCarRecord) -> anyhow::Result<RecordId> {
            if self.fail_inserts {
                anyhow::bail!("disk full");
            }
            let mut records = self.records.lock().unwrap();
            if records
                .iter()
                .any(|r| r.external_listing == record.external_listing)
            {
                anyhow::bail!(
                    "A record for listing {} already exists",
                    record.external_listing
                );
            }
            records.push(record.clone());
            Ok(record.id)
        }
    }

    // --- stub photo importer ---

    struct StubPhotos {
        fail: bool,
        calls: Mutex<Vec<(String, Vec<String>)>>,
    }

    impl StubPhotos {
        fn new() -> Self {
            Self {
                fail: false,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            let mut stub = Self::new();
            stub.fail = true;
            stub
        }

        fn calls(&self) -> Vec<(String, Vec<String>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl IPhotoImporter for StubPhotos {
        async fn import_photos(
            &self,
            context: &PhotoNamingContext,
            urls: &[String],
        ) -> anyhow::Result<Vec<PhotoId>> {
            self.calls
                .lock()
                .unwrap()
                .push((context.slug(), urls.to_vec()));
            if self.fail {
                anyhow::bail!("storage directory unavailable");
            }
            Ok(urls.iter().map(|_| PhotoId::new()).collect())
        }
    }

    fn build(
        marketplace: MockMarketplace,
        store: MemoryStore,
        photos: StubPhotos,
    ) -> (
        SyncEngine,
        Arc<MockMarketplace>,
        Arc<MemoryStore>,
        Arc<StubPhotos>,
    ) {
        let marketplace = Arc::new(marketplace);
        let store = Arc::new(store);
        let photos = Arc::new(photos);
        let engine = SyncEngine::new(marketplace.clone(), store.clone(), photos.clone());
        (engine, marketplace, store, photos)
    }

    // --- full pass ---

    #[tokio::test]
    async fn test_full_pass_creates_record_for_new_listing() {
        let marketplace = MockMarketplace::new()
            .with_generations(10, 20, vec![generation(1, "I", Some(2021), Some(2022))])
            .with_listings(10, 20, 1, 2021, vec![listing("X1")]);
        let store = MemoryStore::new(vec![entry("Audi", "A4", 10, 20)]);
        let (engine, marketplace, store, _) = build(marketplace, store, StubPhotos::new());

        let report = engine.run(false).await;

        assert!(report.is_clean());
        assert_eq!(report.entries_processed, 1);
        assert_eq!(report.years_queried, 2);
        assert_eq!(report.listings_seen, 1);
        assert_eq!(report.records_created, 1);
        assert_eq!(report.duplicates_skipped, 0);

        assert_eq!(
            marketplace.price_queries(),
            vec![(10, 20, 1, 2021), (10, 20, 1, 2022)]
        );

        let records = store.records();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.external_brand.get(), 10);
        assert_eq!(record.external_model.get(), 20);
        assert_eq!(record.external_generation.get(), 1);
        assert_eq!(record.generation_name, "I");
        assert_eq!(record.year, 2021);
        assert_eq!(record.external_listing.as_str(), "X1");
    }

    #[tokio::test]
    async fn test_second_pass_is_idempotent() {
        let marketplace = MockMarketplace::new()
            .with_generations(10, 20, vec![generation(1, "I", Some(2021), Some(2022))])
            .with_listings(10, 20, 1, 2021, vec![listing("X1")]);
        let store = MemoryStore::new(vec![entry("Audi", "A4", 10, 20)]);
        let (engine, _, store, _) = build(marketplace, store, StubPhotos::new());

        let first = engine.run(false).await;
        let second = engine.run(false).await;

        assert_eq!(first.records_created, 1);
        assert_eq!(second.records_created, 0);
        assert_eq!(second.duplicates_skipped, 1);
        assert!(second.is_clean());
        assert_eq!(store.records().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_within_one_pass_is_skipped() {
        // The same car can surface under two model-year queries.
        let marketplace = MockMarketplace::new()
            .with_generations(10, 20, vec![generation(1, "I", Some(2021), Some(2022))])
            .with_listings(10, 20, 1, 2021, vec![listing("X1")])
            .with_listings(10, 20, 1, 2022, vec![listing("X1")]);
        let store = MemoryStore::new(vec![entry("Audi", "A4", 10, 20)]);
        let (engine, _, store, _) = build(marketplace, store, StubPhotos::new());

        let report = engine.run(false).await;

        assert_eq!(report.listings_seen, 2);
        assert_eq!(report.records_created, 1);
        assert_eq!(report.duplicates_skipped, 1);
        assert_eq!(store.records().len(), 1);
    }

    // --- year enumeration ---

    #[tokio::test]
    async fn test_bounded_generation_queries_every_year() {
        let marketplace = MockMarketplace::new().with_generations(
            10,
            20,
            vec![generation(7, "II", Some(2015), Some(2018))],
        );
        let store = MemoryStore::new(vec![entry("Audi", "A4", 10, 20)]);
        let (engine, marketplace, _, _) = build(marketplace, store, StubPhotos::new());

        let report = engine.run(false).await;

        let queried_years: Vec<i32> = marketplace
            .price_queries()
            .iter()
            .map(|(_, _, _, year)| *year)
            .collect();
        assert_eq!(queried_years, vec![2015, 2016, 2017, 2018]);
        assert_eq!(report.years_queried, 4);
    }

    #[tokio::test]
    async fn test_open_ended_generation_runs_to_current_year() {
        let current_year = Utc::now().year();
        let marketplace = MockMarketplace::new().with_generations(
            10,
            20,
            vec![generation(7, "III", Some(current_year - 1), None)],
        );
        let store = MemoryStore::new(vec![entry("Audi", "A4", 10, 20)]);
        let (engine, marketplace, _, _) = build(marketplace, store, StubPhotos::new());

        engine.run(false).await;

        let queried_years: Vec<i32> = marketplace
            .price_queries()
            .iter()
            .map(|(_, _, _, year)| *year)
            .collect();
        assert_eq!(queried_years, vec![current_year - 1, current_year]);
    }

    #[tokio::test]
    async fn test_undated_generation_is_skipped() {
        let marketplace = MockMarketplace::new().with_generations(
            10,
            20,
            vec![generation(7, "unknown era", None, Some(2018))],
        );
        let store = MemoryStore::new(vec![entry("Audi", "A4", 10, 20)]);
        let (engine, marketplace, _, _) = build(marketplace, store, StubPhotos::new());

        let report = engine.run(false).await;

        assert!(marketplace.price_queries().is_empty());
        assert_eq!(report.years_queried, 0);
        assert!(report.is_clean());
    }

    // --- dedupe ---

    #[tokio::test]
    async fn test_known_listing_short_circuits() {
        let entry = entry("Audi", "A4", 10, 20);
        let first_generation = generation(1, "I", Some(2021), Some(2021));
        let known = listing("X1");
        let existing = MileageCarRecord::compose(RecordSource {
            entry: &entry,
            generation: &first_generation,
            year: 2021,
            listing: &known,
            photo_ids: Vec::new(),
        })
        .unwrap();

        let marketplace = MockMarketplace::new()
            .with_generations(10, 20, vec![first_generation.clone()])
            .with_listings(10, 20, 1, 2021, vec![known.clone()]);
        let store = MemoryStore::new(vec![entry.clone()]).with_record(existing);
        let (engine, _, store, photos) = build(marketplace, store, StubPhotos::new());

        let report = engine.run(true).await;

        // No photo import and no insert for an already-known listing.
        assert!(photos.calls().is_empty());
        assert_eq!(report.records_created, 0);
        assert_eq!(report.duplicates_skipped, 1);
        assert!(report.is_clean());
        assert_eq!(store.records().len(), 1);
    }

    // --- photos ---

    #[tokio::test]
    async fn test_photos_imported_when_enabled() {
        let marketplace = MockMarketplace::new()
            .with_generations(10, 20, vec![generation(1, "B9", Some(2021), Some(2021))])
            .with_listings(10, 20, 1, 2021, vec![listing("X1")]);
        let store = MemoryStore::new(vec![entry("Audi", "A4", 10, 20)]);
        let (engine, _, store, photos) = build(marketplace, store, StubPhotos::new());

        let report = engine.run(true).await;

        let calls = photos.calls();
        assert_eq!(calls.len(), 1);
        let (slug, urls) = &calls[0];
        // Brand and model come from listing properties, not the catalog.
        assert_eq!(slug, "audi-a4-b9-2021");
        assert_eq!(urls.len(), 2);

        let records = store.records();
        assert_eq!(records[0].photo_ids.len(), 2);
        assert_eq!(records[0].photo_urls.len(), 2);
        assert_eq!(report.photos_imported, 2);
    }

    #[tokio::test]
    async fn test_photos_skipped_when_disabled() {
        let marketplace = MockMarketplace::new()
            .with_generations(10, 20, vec![generation(1, "I", Some(2021), Some(2021))])
            .with_listings(10, 20, 1, 2021, vec![listing("X1")]);
        let store = MemoryStore::new(vec![entry("Audi", "A4", 10, 20)]);
        let (engine, _, store, photos) = build(marketplace, store, StubPhotos::new());

        let report = engine.run(false).await;

        assert!(photos.calls().is_empty());
        assert_eq!(report.photos_imported, 0);

        let records = store.records();
        assert!(records[0].photo_ids.is_empty());
        // Raw URLs are stored either way, for a later backfill.
        assert_eq!(records[0].photo_urls.len(), 2);
    }

    #[tokio::test]
    async fn test_photo_import_failure_still_creates_record() {
        let marketplace = MockMarketplace::new()
            .with_generations(10, 20, vec![generation(1, "I", Some(2021), Some(2021))])
            .with_listings(10, 20, 1, 2021, vec![listing("X1")]);
        let store = MemoryStore::new(vec![entry("Audi", "A4", 10, 20)]);
        let (engine, _, store, _) = build(marketplace, store, StubPhotos::failing());

        let report = engine.run(true).await;

        assert_eq!(report.records_created, 1);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].stage, SyncStage::PhotoImport);
        assert!(report.issues[0].subject.contains("listing X1"));

        let records = store.records();
        assert!(records[0].photo_ids.is_empty());
        assert_eq!(records[0].photo_urls.len(), 2);
    }

    // --- failure isolation ---

    #[tokio::test]
    async fn test_failed_entry_does_not_stop_others() {
        let marketplace = MockMarketplace::new()
            .with_generations(10, 20, vec![generation(1, "I", Some(2021), Some(2021))])
            .with_listings(10, 20, 1, 2021, vec![listing("X1")])
            .failing_for(30, 40)
            .with_generations(50, 60, vec![generation(2, "I", Some(2021), Some(2021))])
            .with_listings(50, 60, 2, 2021, vec![listing("X2")]);
        let store = MemoryStore::new(vec![
            entry("Audi", "A4", 10, 20),
            entry("BMW", "X5", 30, 40),
            entry("Kia", "Rio", 50, 60),
        ]);
        let (engine, _, store, _) = build(marketplace, store, StubPhotos::new());

        let report = engine.run(false).await;

        assert_eq!(report.entries_processed, 3);
        assert_eq!(report.records_created, 2);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].stage, SyncStage::GenerationFetch);
        assert_eq!(report.issues[0].subject, "BMW X5");
        assert_eq!(store.records().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_year_does_not_stop_other_years() {
        let marketplace = MockMarketplace::new()
            .with_generations(10, 20, vec![generation(1, "I", Some(2021), Some(2022))])
            .failing_year(10, 20, 1, 2021)
            .with_listings(10, 20, 1, 2022, vec![listing("X1")]);
        let store = MemoryStore::new(vec![entry("Audi", "A4", 10, 20)]);
        let (engine, _, store, _) = build(marketplace, store, StubPhotos::new());

        let report = engine.run(false).await;

        assert_eq!(report.years_queried, 2);
        assert_eq!(report.records_created, 1);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].stage, SyncStage::ListingFetch);
        assert_eq!(report.issues[0].subject, "Audi A4 gen 1 year 2021");
        assert_eq!(store.records()[0].year, 2022);
    }

    #[tokio::test]
    async fn test_insert_failure_is_isolated_per_listing() {
        let marketplace = MockMarketplace::new()
            .with_generations(10, 20, vec![generation(1, "I", Some(2021), Some(2021))])
            .with_listings(10, 20, 1, 2021, vec![listing("X1"), listing("X2")]);
        let store = MemoryStore::new(vec![entry("Audi", "A4", 10, 20)]).failing_inserts();
        let (engine, _, _, _) = build(marketplace, store, StubPhotos::new());

        let report = engine.run(false).await;

        assert_eq!(report.listings_seen, 2);
        assert_eq!(report.records_created, 0);
        assert_eq!(report.issues.len(), 2);
        assert!(report
            .issues
            .iter()
            .all(|issue| issue.stage == SyncStage::RecordInsert));
    }

    #[tokio::test]
    async fn test_catalog_load_failure_returns_issue_report() {
        let (engine, marketplace, _, _) = build(
            MockMarketplace::new(),
            MemoryStore::failing_catalog(),
            StubPhotos::new(),
        );

        let report = engine.run(false).await;

        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].stage, SyncStage::CatalogLoad);
        assert_eq!(report.entries_processed, 0);
        assert_eq!(report.records_created, 0);
        assert!(marketplace.generation_queries().is_empty());
    }

    // --- catalog filtering ---

    #[tokio::test]
    async fn test_unmapped_entry_is_skipped() {
        let marketplace = MockMarketplace::new()
            .with_generations(10, 20, vec![generation(1, "I", Some(2021), Some(2021))])
            .with_listings(10, 20, 1, 2021, vec![listing("X1")]);
        let store = MemoryStore::new(vec![
            unmapped_entry("Lada", "Vesta"),
            entry("Audi", "A4", 10, 20),
        ]);
        let (engine, marketplace, store, _) = build(marketplace, store, StubPhotos::new());

        let report = engine.run(false).await;

        assert_eq!(report.entries_skipped, 1);
        assert_eq!(report.entries_processed, 1);
        assert!(report.is_clean());
        assert_eq!(marketplace.generation_queries(), vec![(10, 20)]);
        assert_eq!(store.records().len(), 1);
    }

    // --- helpers ---

    #[test]
    fn test_render_chain_includes_sources() {
        let root = anyhow::anyhow!("connection refused");
        let err = root.context("price query failed");
        assert_eq!(render_chain(&err), "price query failed: connection refused");
    }
}
