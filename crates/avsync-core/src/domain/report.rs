//! Sync run reporting
//!
//! A crawl never aborts on a single bad entry, generation, year or
//! listing. Instead every failure is isolated, converted into a
//! [`SyncIssue`] naming the pipeline stage and cause, and the traversal
//! continues with its siblings. The [`SyncReport`] collects those issues
//! together with the run counters and is what a completed run hands back
//! to its caller.

use std::fmt;

use serde::Serialize;

// ============================================================================
// Pipeline stages
// ============================================================================

/// The pipeline stage an issue occurred in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStage {
    /// Loading the catalog of brand/model entries
    CatalogLoad,
    /// Fetching the generations of one catalog entry
    GenerationFetch,
    /// Fetching last-sold listings for one (generation, year) pair
    ListingFetch,
    /// Checking whether a listing was already ingested
    DedupeLookup,
    /// Downloading and re-hosting listing photos
    PhotoImport,
    /// Persisting a composed record
    RecordInsert,
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::CatalogLoad => "catalog load",
            Self::GenerationFetch => "generation fetch",
            Self::ListingFetch => "listing fetch",
            Self::DedupeLookup => "dedupe lookup",
            Self::PhotoImport => "photo import",
            Self::RecordInsert => "record insert",
        };
        write!(f, "{label}")
    }
}

// ============================================================================
// Issues
// ============================================================================

/// One isolated failure captured during a run
#[derive(Debug, Clone, Serialize)]
pub struct SyncIssue {
    /// Where in the pipeline the failure happened
    pub stage: SyncStage,
    /// What was being processed, e.g. `"Audi A4"` or `"Audi A4 gen 4986 year 2021"`
    pub subject: String,
    /// The rendered error chain
    pub cause: String,
}

impl SyncIssue {
    pub fn new(stage: SyncStage, subject: impl Into<String>, cause: impl fmt::Display) -> Self {
        Self {
            stage,
            subject: subject.into(),
            cause: cause.to_string(),
        }
    }
}

impl fmt::Display for SyncIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.stage, self.subject, self.cause)
    }
}

// ============================================================================
// Run report
// ============================================================================

/// Summary of a completed crawl
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    /// Catalog entries with marketplace ids that were traversed
    pub entries_processed: u32,
    /// Catalog entries skipped for missing marketplace ids
    pub entries_skipped: u32,
    /// (generation, year) pairs queried for listings
    pub years_queried: u32,
    /// Listings returned by the marketplace across all queries
    pub listings_seen: u32,
    /// New records persisted
    pub records_created: u32,
    /// Listings skipped because their id was already known
    pub duplicates_skipped: u32,
    /// Photos successfully imported
    pub photos_imported: u32,
    /// Isolated failures, in traversal order
    pub issues: Vec<SyncIssue>,
    /// Wall-clock duration of the run in milliseconds
    pub duration_ms: u64,
}

impl SyncReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an isolated failure and logs nothing; callers decide how loud
    /// to be about the issue before recording it.
    pub fn record_issue(
        &mut self,
        stage: SyncStage,
        subject: impl Into<String>,
        cause: impl fmt::Display,
    ) {
        self.issues.push(SyncIssue::new(stage, subject, cause));
    }

    /// Whether the run completed without a single isolated failure
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}
