//! AvbyMarketplaceProvider - IMarketplaceProvider implementation for av.by
//!
//! Wraps the [`AvbyClient`] and maps its wire DTOs into domain types to
//! fulfil the [`IMarketplaceProvider`] port contract.
//!
//! ## Design Notes
//!
//! - Individual items that fail domain validation (zero generation id,
//!   blank advert id) are skipped with a warning rather than failing the
//!   whole response; one malformed advert must not hide its siblings.
//! - Property values arrive as raw JSON; strings are kept verbatim, other
//!   scalars are rendered to text, and null-valued properties are dropped.
//! - Each photo is reduced to one URL, preferring the largest size
//!   variant the marketplace offers.

use anyhow::Result;
use tracing::warn;

use avsync_core::domain::errors::DomainError;
use avsync_core::domain::generation::Generation;
use avsync_core::domain::listing::{LastSoldListing, ListingProperty};
use avsync_core::domain::newtypes::{
    ExternalBrandId, ExternalGenerationId, ExternalModelId, ListingId,
};
use avsync_core::ports::marketplace_provider::IMarketplaceProvider;

use crate::client::{AdvertDto, AvbyClient, GenerationDto, PhotoDto};

// ============================================================================
// DTO to domain mapping
// ============================================================================

/// Converts a wire [`GenerationDto`] into a domain [`Generation`]
fn generation_from_dto(dto: GenerationDto) -> Result<Generation, DomainError> {
    Ok(Generation {
        id: ExternalGenerationId::new(dto.id)?,
        name: dto.name,
        year_from: dto.year_from,
        year_to: dto.year_to,
    })
}

/// Converts a wire [`AdvertDto`] into a domain [`LastSoldListing`]
fn listing_from_dto(dto: AdvertDto) -> Result<LastSoldListing, DomainError> {
    let external_id = ListingId::new(dto.id)?;

    let properties = dto
        .properties
        .into_iter()
        .filter_map(|property| {
            render_property_value(&property.value).map(|value| ListingProperty {
                name: property.name,
                value,
            })
        })
        .collect();

    let photo_urls = dto.photos.iter().filter_map(photo_url).collect();

    Ok(LastSoldListing {
        external_id,
        properties,
        photo_urls,
    })
}

/// Renders a property value as text
///
/// Strings are kept verbatim; numbers and booleans are rendered; null
/// means the property carries no information and is dropped.
fn render_property_value(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Picks the URL of the largest available size variant of a photo
fn photo_url(photo: &PhotoDto) -> Option<String> {
    photo
        .big
        .as_ref()
        .or(photo.medium.as_ref())
        .or(photo.small.as_ref())
        .map(|variant| variant.url.clone())
}

// ============================================================================
// AvbyMarketplaceProvider
// ============================================================================

/// Marketplace provider implementation that delegates to the av.by API
pub struct AvbyMarketplaceProvider {
    /// The underlying av.by API client
    client: AvbyClient,
}

impl AvbyMarketplaceProvider {
    /// Creates a new `AvbyMarketplaceProvider` wrapping the given [`AvbyClient`]
    pub fn new(client: AvbyClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl IMarketplaceProvider for AvbyMarketplaceProvider {
    /// Lists the generations of one marketplace model
    ///
    /// Delegates to [`AvbyClient::generations`] and maps each DTO to a
    /// domain [`Generation`], skipping invalid entries.
    async fn list_generations(
        &self,
        brand: ExternalBrandId,
        model: ExternalModelId,
    ) -> Result<Vec<Generation>> {
        let dtos = self.client.generations(brand, model).await?;

        let mut generations = Vec::with_capacity(dtos.len());
        for dto in dtos {
            match generation_from_dto(dto) {
                Ok(generation) => generations.push(generation),
                Err(err) => {
                    warn!(%brand, %model, error = %err, "Skipping invalid generation");
                }
            }
        }
        Ok(generations)
    }

    /// Lists the last-sold listings for one (generation, model year) query
    ///
    /// Delegates to [`AvbyClient::price_statistics`] and maps each advert
    /// to a domain [`LastSoldListing`], skipping invalid entries.
    async fn list_last_sold(
        &self,
        brand: ExternalBrandId,
        model: ExternalModelId,
        generation: ExternalGenerationId,
        year: i32,
    ) -> Result<Vec<LastSoldListing>> {
        let statistics = self
            .client
            .price_statistics(brand, model, generation, year)
            .await?;

        let mut listings = Vec::with_capacity(statistics.last_sold_adverts.len());
        for advert in statistics.last_sold_adverts {
            match listing_from_dto(advert) {
                Ok(listing) => listings.push(listing),
                Err(err) => {
                    warn!(%brand, %model, %generation, year, error = %err, "Skipping invalid advert");
                }
            }
        }
        Ok(listings)
    }
}

// ============================================================================
// Tests
// ============================================================================
