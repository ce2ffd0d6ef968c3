//! SQLite implementation of IRecordStore
//!
//! This module provides the concrete SQLite-based implementation of the
//! record store port defined in avsync-core. It handles all domain type
//! serialization/deserialization and SQL query construction.
//!
//! ## Type Mapping
//!
//! | Domain Type                | SQL Type | Strategy                     |
//! |----------------------------|----------|------------------------------|
//! | BrandId, ModelId, RecordId | TEXT     | UUID string via `.to_string()` / `FromStr` |
//! | ExternalBrandId, ExternalModelId, ExternalGenerationId | INTEGER | `u32` via `.get()` / `::new()` |
//! | ListingId                  | TEXT     | String via `.as_str()` / `ListingId::new()` |
//! | Vec\<ListingProperty\>     | TEXT     | serde_json serialization     |
//! | Vec\<PhotoId\>             | TEXT     | serde_json array of UUID strings |
//! | Vec\<String\> (photo URLs) | TEXT     | serde_json array             |
//! | DateTime\<Utc\>            | TEXT     | ISO 8601 via `to_rfc3339()` / `DateTime::parse_from_rfc3339()` |

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use avsync_core::domain::{
    newtypes::{
        BrandId, ExternalBrandId, ExternalGenerationId, ExternalModelId, ListingId, ModelId,
        PhotoId, RecordId,
    },
    CatalogEntry, ListingProperty, MileageCarRecord,
};
use avsync_core::ports::IRecordStore;

use crate::StoreError;

/// Shared column list for catalog reads
///
/// A catalog entry is one models row joined with its owning brand; the
/// aliases keep the two `uuid`/`name`/`avby_id` column pairs apart.
const CATALOG_SELECT: &str = "SELECT models.uuid AS model_uuid, models.name AS model_name, \
     models.avby_id AS model_avby_id, brands.uuid AS brand_uuid, \
     brands.name AS brand_name, brands.avby_id AS brand_avby_id \
     FROM models JOIN brands ON brands.uuid = models.brand_uuid";

/// SQLite-based implementation of the record store port
///
/// Provides persistent storage for the crawl catalog and ingested
/// records. All operations are performed through a connection pool for
/// concurrency.
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    /// Creates a new store instance with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts or updates a (brand, model) catalog pair
    ///
    /// Brands are matched by name and shared across models; within a
    /// brand, a model is matched by name. Supplied marketplace ids
    /// overwrite stored ones, while `None` leaves an existing mapping
    /// untouched, so re-running a seeding command is safe.
    ///
    /// This lives off the `IRecordStore` port: the sync pipeline only
    /// reads the catalog, and seeding is a CLI concern.
    pub async fn add_catalog_entry(
        &self,
        brand_name: &str,
        model_name: &str,
        external_brand: Option<ExternalBrandId>,
        external_model: Option<ExternalModelId>,
    ) -> Result<CatalogEntry, StoreError> {
        let existing_brand: Option<String> =
            sqlx::query_scalar("SELECT uuid FROM brands WHERE name = ?")
                .bind(brand_name)
                .fetch_optional(&self.pool)
                .await?;

        let brand_uuid = match existing_brand {
            Some(uuid) => {
                if let Some(id) = external_brand {
                    sqlx::query("UPDATE brands SET avby_id = ? WHERE uuid = ?")
                        .bind(id.get())
                        .bind(&uuid)
                        .execute(&self.pool)
                        .await?;
                }
                uuid
            }
            None => {
                let uuid = BrandId::new().to_string();
                sqlx::query("INSERT INTO brands (uuid, name, avby_id) VALUES (?, ?, ?)")
                    .bind(&uuid)
                    .bind(brand_name)
                    .bind(external_brand.map(|id| id.get()))
                    .execute(&self.pool)
                    .await?;
                uuid
            }
        };

        let existing_model: Option<String> =
            sqlx::query_scalar("SELECT uuid FROM models WHERE brand_uuid = ? AND name = ?")
                .bind(&brand_uuid)
                .bind(model_name)
                .fetch_optional(&self.pool)
                .await?;

        let model_uuid = match existing_model {
            Some(uuid) => {
                if let Some(id) = external_model {
                    sqlx::query("UPDATE models SET avby_id = ? WHERE uuid = ?")
                        .bind(id.get())
                        .bind(&uuid)
                        .execute(&self.pool)
                        .await?;
                }
                uuid
            }
            None => {
                let uuid = ModelId::new().to_string();
                sqlx::query(
                    "INSERT INTO models (uuid, brand_uuid, name, avby_id) VALUES (?, ?, ?, ?)",
                )
                .bind(&uuid)
                .bind(&brand_uuid)
                .bind(model_name)
                .bind(external_model.map(|id| id.get()))
                .execute(&self.pool)
                .await?;
                uuid
            }
        };

        // Read the pair back so the returned entry reflects stored state,
        // including marketplace ids kept from an earlier seeding run.
        let sql = format!("{} WHERE models.uuid = ?", CATALOG_SELECT);
        let row = sqlx::query(&sql)
            .bind(&model_uuid)
            .fetch_one(&self.pool)
            .await?;
        let entry = entry_from_row(&row)?;

        tracing::debug!(brand = brand_name, model = model_name, "Catalog entry saved");
        Ok(entry)
    }
}

// ============================================================================
// Helper functions for type conversion
// ============================================================================

/// Parse a DateTime<Utc> from an ISO 8601 string
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Try parsing without timezone (SQLite default format)
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .or_else(|_| chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
                .map(|ndt| ndt.and_utc())
        })
        .map_err(|e| {
            StoreError::SerializationError(format!("Failed to parse datetime '{}': {}", s, e))
        })
}

/// Convert a nullable marketplace brand id column to its domain newtype
fn external_brand_from_column(raw: Option<u32>) -> Result<Option<ExternalBrandId>, StoreError> {
    match raw {
        Some(value) => ExternalBrandId::new(value).map(Some).map_err(|e| {
            StoreError::SerializationError(format!("Invalid marketplace brand id: {}", e))
        }),
        None => Ok(None),
    }
}

/// Convert a nullable marketplace model id column to its domain newtype
fn external_model_from_column(raw: Option<u32>) -> Result<Option<ExternalModelId>, StoreError> {
    match raw {
        Some(value) => ExternalModelId::new(value).map(Some).map_err(|e| {
            StoreError::SerializationError(format!("Invalid marketplace model id: {}", e))
        }),
        None => Ok(None),
    }
}

// ============================================================================
// Row mapping functions
// ============================================================================

/// Reconstruct a CatalogEntry from a joined models/brands row
fn entry_from_row(row: &SqliteRow) -> Result<CatalogEntry, StoreError> {
    let brand_uuid_str: String = row.get("brand_uuid");
    let model_uuid_str: String = row.get("model_uuid");
    let brand_name: String = row.get("brand_name");
    let model_name: String = row.get("model_name");
    let brand_avby: Option<u32> = row.get("brand_avby_id");
    let model_avby: Option<u32> = row.get("model_avby_id");

    let brand_id = BrandId::from_str(&brand_uuid_str).map_err(|e| {
        StoreError::SerializationError(format!("Invalid BrandId '{}': {}", brand_uuid_str, e))
    })?;

    let model_id = ModelId::from_str(&model_uuid_str).map_err(|e| {
        StoreError::SerializationError(format!("Invalid ModelId '{}': {}", model_uuid_str, e))
    })?;

    Ok(CatalogEntry {
        brand_id,
        model_id,
        brand_name,
        model_name,
        external_brand: external_brand_from_column(brand_avby)?,
        external_model: external_model_from_column(model_avby)?,
    })
}

/// Reconstruct a MileageCarRecord from a database row
fn record_from_row(row: &SqliteRow) -> Result<MileageCarRecord, StoreError> {
    let uuid_str: String = row.get("uuid");
    let brand_uuid_str: String = row.get("brand_uuid");
    let model_uuid_str: String = row.get("model_uuid");
    let avby_brand: u32 = row.get("avby_brand_id");
    let avby_model: u32 = row.get("avby_model_id");
    let avby_generation: u32 = row.get("avby_generation_id");
    let generation_name: String = row.get("generation_name");
    let year: i32 = row.get("year");
    let listing_id_str: String = row.get("external_listing_id");
    let properties_str: String = row.get("properties");
    let photo_ids_str: String = row.get("photo_ids");
    let photo_urls_str: String = row.get("photo_urls");
    let created_at_str: String = row.get("created_at");

    let id = RecordId::from_str(&uuid_str).map_err(|e| {
        StoreError::SerializationError(format!("Invalid RecordId '{}': {}", uuid_str, e))
    })?;

    let brand_id = BrandId::from_str(&brand_uuid_str).map_err(|e| {
        StoreError::SerializationError(format!("Invalid BrandId '{}': {}", brand_uuid_str, e))
    })?;

    let model_id = ModelId::from_str(&model_uuid_str).map_err(|e| {
        StoreError::SerializationError(format!("Invalid ModelId '{}': {}", model_uuid_str, e))
    })?;

    let external_brand = ExternalBrandId::new(avby_brand).map_err(|e| {
        StoreError::SerializationError(format!("Invalid marketplace brand id: {}", e))
    })?;

    let external_model = ExternalModelId::new(avby_model).map_err(|e| {
        StoreError::SerializationError(format!("Invalid marketplace model id: {}", e))
    })?;

    let external_generation = ExternalGenerationId::new(avby_generation).map_err(|e| {
        StoreError::SerializationError(format!("Invalid marketplace generation id: {}", e))
    })?;

    let external_listing = ListingId::new(listing_id_str.clone()).map_err(|e| {
        StoreError::SerializationError(format!("Invalid ListingId '{}': {}", listing_id_str, e))
    })?;

    let properties: Vec<ListingProperty> = serde_json::from_str(&properties_str)
        .map_err(|e| StoreError::SerializationError(format!("Invalid properties JSON: {}", e)))?;

    let photo_ids: Vec<PhotoId> = serde_json::from_str(&photo_ids_str)
        .map_err(|e| StoreError::SerializationError(format!("Invalid photo_ids JSON: {}", e)))?;

    let photo_urls: Vec<String> = serde_json::from_str(&photo_urls_str)
        .map_err(|e| StoreError::SerializationError(format!("Invalid photo_urls JSON: {}", e)))?;

    let created_at = parse_datetime(&created_at_str)?;

    Ok(MileageCarRecord {
        id,
        brand_id,
        model_id,
        external_brand,
        external_model,
        external_generation,
        generation_name,
        year,
        external_listing,
        properties,
        photo_ids,
        photo_urls,
        created_at,
    })
}

// ============================================================================
// IRecordStore implementation
// ============================================================================

#[async_trait::async_trait]
impl IRecordStore for SqliteRecordStore {
    async fn list_catalog_entries(&self) -> anyhow::Result<Vec<CatalogEntry>> {
        let sql = format!("{} ORDER BY models.rowid", CATALOG_SELECT);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            entries.push(entry_from_row(row)?);
        }

        Ok(entries)
    }

    async fn find_by_listing_id(
        &self,
        id: &ListingId,
    ) -> anyhow::Result<Option<MileageCarRecord>> {
        let row = sqlx::query("SELECT * FROM mileage_cars WHERE external_listing_id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(record_from_row(r)?)),
            None => Ok(None),
        }
    }

    async fn insert_record(&self, record: &MileageCarRecord) -> anyhow::Result<RecordId> {
        let properties = serde_json::to_string(&record.properties)
            .map_err(|e| anyhow::anyhow!("Failed to serialize properties: {}", e))?;
        let photo_ids = serde_json::to_string(&record.photo_ids)
            .map_err(|e| anyhow::anyhow!("Failed to serialize photo_ids: {}", e))?;
        let photo_urls = serde_json::to_string(&record.photo_urls)
            .map_err(|e| anyhow::anyhow!("Failed to serialize photo_urls: {}", e))?;

        let result = sqlx::query(
            "INSERT INTO mileage_cars \
             (uuid, brand_uuid, model_uuid, avby_brand_id, avby_model_id, \
              avby_generation_id, generation_name, year, external_listing_id, \
              properties, photo_ids, photo_urls, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.id.to_string())
        .bind(record.brand_id.to_string())
        .bind(record.model_id.to_string())
        .bind(record.external_brand.get())
        .bind(record.external_model.get())
        .bind(record.external_generation.get())
        .bind(&record.generation_name)
        .bind(record.year)
        .bind(record.external_listing.as_str())
        .bind(&properties)
        .bind(&photo_ids)
        .bind(&photo_urls)
        .bind(record.created_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                tracing::trace!(
                    record_id = %record.id,
                    listing_id = %record.external_listing,
                    "Inserted mileage car record"
                );
                Ok(record.id)
            }
            // Surface the dedupe backstop distinctly from transport errors
            Err(sqlx::Error::Database(db))
                if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation) =>
            {
                Err(anyhow::anyhow!(
                    "A record for listing {} already exists",
                    record.external_listing
                ))
            }
            Err(e) => Err(e.into()),
        }
    }
}
