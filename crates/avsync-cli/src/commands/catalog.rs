//! Catalog command - manage the (brand, model) crawl catalog
//!
//! The sync pass only crawls catalog entries, so this is where pairs are
//! seeded and inspected. Entries without av.by identifiers may be added
//! (for manually tracked vehicles) but are skipped by the crawl until
//! their mapping is filled in.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;

use avsync_core::domain::catalog::CatalogEntry;

use crate::output::{get_formatter, OutputFormat, OutputFormatter};

/// Catalog subcommands
#[derive(Debug, Subcommand)]
pub enum CatalogCommand {
    /// Add or update a (brand, model) pair
    Add {
        /// Brand display name, e.g. "Audi"
        #[arg(value_name = "BRAND")]
        brand: String,
        /// Model display name, e.g. "A4"
        #[arg(value_name = "MODEL")]
        model: String,
        /// av.by brand id for the pair
        #[arg(long, value_name = "ID")]
        avby_brand: Option<u32>,
        /// av.by model id for the pair
        #[arg(long, value_name = "ID")]
        avby_model: Option<u32>,
    },
    /// List catalog entries and their marketplace mappings
    List,
}

impl CatalogCommand {
    /// Execute the catalog command
    pub async fn execute(&self, config_path: Option<&Path>, format: OutputFormat) -> Result<()> {
        match self {
            CatalogCommand::Add {
                brand,
                model,
                avby_brand,
                avby_model,
            } => {
                self.execute_add(brand, model, *avby_brand, *avby_model, config_path, format)
                    .await
            }
            CatalogCommand::List => self.execute_list(config_path, format).await,
        }
    }

    /// Upserts one (brand, model) pair into the catalog
    async fn execute_add(
        &self,
        brand: &str,
        model: &str,
        avby_brand: Option<u32>,
        avby_model: Option<u32>,
        config_path: Option<&Path>,
        format: OutputFormat,
    ) -> Result<()> {
        use avsync_core::config::Config;
        use avsync_core::domain::newtypes::{ExternalBrandId, ExternalModelId};
        use avsync_store::{DatabasePool, SqliteRecordStore};

        let formatter = get_formatter(format);

        let external_brand = match avby_brand.map(ExternalBrandId::new).transpose() {
            Ok(id) => id,
            Err(err) => {
                formatter.error(&format!("Invalid --avby-brand value: {err}"));
                return Ok(());
            }
        };
        let external_model = match avby_model.map(ExternalModelId::new).transpose() {
            Ok(id) => id,
            Err(err) => {
                formatter.error(&format!("Invalid --avby-model value: {err}"));
                return Ok(());
            }
        };

        let config_file = super::config::resolve_config_path(config_path);
        let config = Config::load_or_default(&config_file);

        let pool = DatabasePool::new(&config.store.database_path)
            .await
            .context("Failed to open record store")?;
        let store = SqliteRecordStore::new(pool.pool().clone());

        info!(brand, model, "Adding catalog entry");
        let entry = store
            .add_catalog_entry(brand, model, external_brand, external_model)
            .await
            .context("Failed to save catalog entry")?;

        if format == OutputFormat::Json {
            let json =
                serde_json::to_value(&entry).context("Failed to serialize catalog entry")?;
            formatter.print_json(&json);
            return Ok(());
        }

        match entry.marketplace_ids() {
            Some((brand_id, model_id)) => formatter.success(&format!(
                "Saved {} (av.by {}/{})",
                entry.label(),
                brand_id,
                model_id
            )),
            None => {
                formatter.success(&format!("Saved {}", entry.label()));
                formatter.info("No av.by mapping yet; crawl passes skip this entry");
            }
        }
        Ok(())
    }

    /// Prints every catalog entry with its mapping state
    async fn execute_list(&self, config_path: Option<&Path>, format: OutputFormat) -> Result<()> {
        use avsync_core::config::Config;
        use avsync_core::ports::IRecordStore;
        use avsync_store::{DatabasePool, SqliteRecordStore};

        let formatter = get_formatter(format);

        let config_file = super::config::resolve_config_path(config_path);
        let config = Config::load_or_default(&config_file);

        let pool = DatabasePool::new(&config.store.database_path)
            .await
            .context("Failed to open record store")?;
        let store = SqliteRecordStore::new(pool.pool().clone());

        let entries = store
            .list_catalog_entries()
            .await
            .context("Failed to load catalog")?;

        if format == OutputFormat::Json {
            let json = serde_json::to_value(&entries).context("Failed to serialize catalog")?;
            formatter.print_json(&json);
            return Ok(());
        }

        render_entries(&entries, formatter.as_ref());
        Ok(())
    }
}

/// Renders catalog entries as indented human-readable rows
fn render_entries(entries: &[CatalogEntry], formatter: &dyn OutputFormatter) {
    if entries.is_empty() {
        formatter.info("Catalog is empty; seed it with `avsync catalog add`");
        return;
    }

    formatter.success(&format!(
        "{} catalog entr{}",
        entries.len(),
        if entries.len() == 1 { "y" } else { "ies" }
    ));
    for entry in entries {
        match entry.marketplace_ids() {
            Some((brand, model)) => {
                formatter.info(&format!("{} (av.by {}/{})", entry.label(), brand, model));
            }
            None => formatter.info(&format!("{} (not mapped)", entry.label())),
        }
    }
}
