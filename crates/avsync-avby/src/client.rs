//! av.by API client
//!
//! Provides a typed HTTP client for the public av.by marketplace API.
//! Handles URL construction, JSON deserialization, and the API's habit of
//! answering 404 for brand/model/generation combinations it has no data for.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use avsync_avby::client::AvbyClient;
//! use avsync_core::domain::newtypes::{ExternalBrandId, ExternalModelId};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = AvbyClient::new(Duration::from_secs(30))?;
//! let brand = ExternalBrandId::new(8)?;
//! let model = ExternalModelId::new(5)?;
//! let generations = client.generations(brand, model).await?;
//! println!("{} generations", generations.len());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use avsync_core::domain::newtypes::{ExternalBrandId, ExternalGenerationId, ExternalModelId};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use tracing::debug;

/// Base URL for the public av.by API
const DEFAULT_BASE_URL: &str = "https://api.av.by";

// ============================================================================
// av.by response types
// ============================================================================

/// One generation from the model generations endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationDto {
    /// Marketplace generation id
    pub id: u32,
    /// Display name, e.g. "IV (B9) · Рестайлинг"
    pub name: String,
    /// First production year; absent for generations without year data
    pub year_from: Option<i32>,
    /// Last production year; absent while the generation is still sold
    pub year_to: Option<i32>,
}

/// Response from the price-statistics endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceStatisticsDto {
    /// Recently sold adverts for the queried combination
    #[serde(default)]
    pub last_sold_adverts: Vec<AdvertDto>,
}

/// One sold advert from the price-statistics response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvertDto {
    /// Advert id; the API serves numbers, but strings are tolerated
    #[serde(deserialize_with = "advert_id")]
    pub id: String,
    /// Descriptive name/value pairs (brand, model, mileage, ...)
    #[serde(default)]
    pub properties: Vec<PropertyDto>,
    /// Photos, each offered in several sizes
    #[serde(default)]
    pub photos: Vec<PhotoDto>,
}

/// One name/value property of an advert
///
/// Values are not uniformly typed upstream (strings, numbers, booleans,
/// occasionally null), so the raw JSON value is kept and stringified later.
#[derive(Debug, Clone, Deserialize)]
pub struct PropertyDto {
    pub name: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

/// Size variants of one advert photo
#[derive(Debug, Clone, Deserialize)]
pub struct PhotoDto {
    pub big: Option<PhotoVariantDto>,
    pub medium: Option<PhotoVariantDto>,
    pub small: Option<PhotoVariantDto>,
}

/// A single size variant of a photo
#[derive(Debug, Clone, Deserialize)]
pub struct PhotoVariantDto {
    pub url: String,
}

/// Deserializes an advert id from either a JSON number or a JSON string
fn advert_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Number(n) => n.to_string(),
        Raw::Text(s) => s,
    })
}

// ============================================================================
// AvbyClient
// ============================================================================

/// HTTP client for av.by API calls
///
/// Wraps `reqwest::Client` with base URL construction and typed responses.
/// The API is anonymous, so there is no authentication state to manage.
pub struct AvbyClient {
    /// The underlying HTTP client
    client: Client,
    /// Base URL for API requests
    base_url: String,
}

impl AvbyClient {
    /// Creates a new AvbyClient against the production API
    ///
    /// # Arguments
    /// * `timeout` - Per-request timeout applied to every API call
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_base_url(timeout, DEFAULT_BASE_URL)
    }

    /// Creates a new AvbyClient with a custom base URL (useful for testing)
    ///
    /// # Arguments
    /// * `timeout` - Per-request timeout applied to every API call
    /// * `base_url` - Custom base URL for API requests
    pub fn with_base_url(timeout: Duration, base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Creates a GET request builder for the given path
    ///
    /// Automatically prepends the base URL.
    ///
    /// # Arguments
    /// * `path` - API path relative to base URL, including any query string
    pub fn request(&self, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.get(&url)
    }

    /// Returns the base URL for API requests
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Retrieves the generations of one model
    ///
    /// Makes `GET /offer-types/cars/catalog/brand-items/{brand}/models/{model}/generations`.
    /// A 404 response means the marketplace has no generation data for the
    /// pair and is returned as an empty vector.
    pub async fn generations(
        &self,
        brand: ExternalBrandId,
        model: ExternalModelId,
    ) -> Result<Vec<GenerationDto>> {
        let path = format!(
            "/offer-types/cars/catalog/brand-items/{}/models/{}/generations",
            brand.get(),
            model.get()
        );
        debug!(%brand, %model, "Fetching generations");

        let response = self
            .request(&path)
            .send()
            .await
            .context("Failed to fetch generations")?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(%brand, %model, "Marketplace has no generations for model");
            return Ok(Vec::new());
        }

        let generations: Vec<GenerationDto> = response
            .error_for_status()
            .context("Generations request returned error status")?
            .json()
            .await
            .context("Failed to parse generations response")?;

        debug!(%brand, %model, count = generations.len(), "Fetched generations");
        Ok(generations)
    }

    /// Retrieves price statistics for one (generation, year) combination
    ///
    /// Makes `GET /offer-types/cars/price-statistics?brand=&generation=&model=&year=`.
    /// The interesting part of the response is `lastSoldAdverts`. A 404
    /// response means no statistics exist for the combination and is
    /// returned as an empty statistics object.
    pub async fn price_statistics(
        &self,
        brand: ExternalBrandId,
        model: ExternalModelId,
        generation: ExternalGenerationId,
        year: i32,
    ) -> Result<PriceStatisticsDto> {
        let path = format!(
            "/offer-types/cars/price-statistics?brand={}&generation={}&model={}&year={}",
            brand.get(),
            generation.get(),
            model.get(),
            year
        );
        debug!(%brand, %model, %generation, year, "Fetching price statistics");

        let response = self
            .request(&path)
            .send()
            .await
            .context("Failed to fetch price statistics")?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(%brand, %model, %generation, year, "No statistics for combination");
            return Ok(PriceStatisticsDto {
                last_sold_adverts: Vec::new(),
            });
        }

        let statistics: PriceStatisticsDto = response
            .error_for_status()
            .context("Price statistics request returned error status")?
            .json()
            .await
            .context("Failed to parse price statistics response")?;

        debug!(
            %brand, %model, %generation, year,
            adverts = statistics.last_sold_adverts.len(),
            "Fetched price statistics"
        );
        Ok(statistics)
    }
}
