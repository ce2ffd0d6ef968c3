//! Sync command - run one crawl pass over the catalog
//!
//! Wires the record store, the av.by provider and the photo importer
//! together, runs a single engine pass, and renders the resulting report.
//! Failures inside the pass are part of the report, not errors of the
//! command; the exit code only reflects setup problems such as an
//! unreachable database.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use avsync_core::domain::catalog::CatalogEntry;
use avsync_core::domain::report::SyncReport;

use crate::output::{get_formatter, OutputFormat, OutputFormatter};

/// Run one crawl pass over the catalog
#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Download and re-host photos of newly created records
    #[arg(long)]
    with_photos: bool,

    /// Only show which catalog entries a pass would crawl
    #[arg(long)]
    dry_run: bool,
}

impl SyncCommand {
    /// Execute the sync command
    pub async fn execute(&self, config_path: Option<&Path>, format: OutputFormat) -> Result<()> {
        use std::sync::Arc;
        use std::time::Duration;

        use avsync_avby::{AvbyClient, AvbyMarketplaceProvider};
        use avsync_core::config::Config;
        use avsync_core::ports::IRecordStore;
        use avsync_engine::SyncEngine;
        use avsync_photos::FilePhotoImporter;
        use avsync_store::{DatabasePool, SqliteRecordStore};

        let formatter = get_formatter(format);

        // 1. Load configuration
        let path = super::config::resolve_config_path(config_path);
        let config = Config::load_or_default(&path);

        // 2. Open the record store
        let pool = DatabasePool::new(&config.store.database_path)
            .await
            .context("Failed to open record store")?;
        let store = Arc::new(SqliteRecordStore::new(pool.pool().clone()));

        if self.dry_run {
            let entries = store
                .list_catalog_entries()
                .await
                .context("Failed to load catalog")?;
            return render_dry_run(&entries, formatter.as_ref(), format);
        }

        // 3. Build the marketplace provider and the photo importer
        let timeout = Duration::from_secs(config.api.timeout_secs);
        let client = AvbyClient::with_base_url(timeout, config.api.base_url.as_str())?;
        let marketplace = Arc::new(AvbyMarketplaceProvider::new(client));
        let photos = Arc::new(
            FilePhotoImporter::new(timeout, config.photos.storage_dir.clone())
                .context("Failed to build photo importer")?,
        );

        // 4. Run one pass
        let with_photos = self.with_photos || config.sync.with_photos;
        info!(with_photos, "Starting crawl pass");
        let engine = SyncEngine::new(marketplace, store, photos);
        let report = engine.run(with_photos).await;

        // 5. Render the report
        render_report(&report, with_photos, formatter.as_ref(), format)
    }
}

/// Renders the dry-run view: which entries a pass would crawl
fn render_dry_run(
    entries: &[CatalogEntry],
    formatter: &dyn OutputFormatter,
    format: OutputFormat,
) -> Result<()> {
    let crawlable = entries
        .iter()
        .filter(|entry| entry.marketplace_ids().is_some())
        .count();

    if format == OutputFormat::Json {
        let json = serde_json::json!({
            "dry_run": true,
            "entries": entries.len(),
            "crawlable": crawlable,
            "catalog": serde_json::to_value(entries).context("Failed to serialize catalog")?,
        });
        formatter.print_json(&json);
        return Ok(());
    }

    for entry in entries {
        match entry.marketplace_ids() {
            Some((brand, model)) => {
                formatter.info(&format!("{} (av.by {}/{})", entry.label(), brand, model));
            }
            None => formatter.info(&format!("{} (no marketplace ids, skipped)", entry.label())),
        }
    }
    formatter.success(&format!(
        "Dry run: {} of {} catalog entr{} would be crawled",
        crawlable,
        entries.len(),
        if entries.len() == 1 { "y" } else { "ies" }
    ));
    Ok(())
}

/// Renders a completed pass for humans or scripts
fn render_report(
    report: &SyncReport,
    with_photos: bool,
    formatter: &dyn OutputFormatter,
    format: OutputFormat,
) -> Result<()> {
    if format == OutputFormat::Json {
        let json = serde_json::to_value(report).context("Failed to serialize report")?;
        formatter.print_json(&json);
        return Ok(());
    }

    let seconds = report.duration_ms as f64 / 1000.0;
    formatter.success(&format!(
        "Crawl pass finished in {:.1}s: {} new record{}",
        seconds,
        report.records_created,
        if report.records_created == 1 { "" } else { "s" }
    ));
    formatter.info(&format!(
        "{} catalog entries crawled, {} skipped without marketplace ids",
        report.entries_processed, report.entries_skipped
    ));
    formatter.info(&format!(
        "{} listings seen in {} year queries, {} already known",
        report.listings_seen, report.years_queried, report.duplicates_skipped
    ));
    if with_photos {
        formatter.info(&format!("{} photos imported", report.photos_imported));
    }

    if !report.is_clean() {
        formatter.warn(&format!(
            "{} step{} failed during the pass",
            report.issues.len(),
            if report.issues.len() == 1 { "" } else { "s" }
        ));
        for issue in &report.issues {
            formatter.info(&issue.to_string());
        }
    }

    Ok(())
}
