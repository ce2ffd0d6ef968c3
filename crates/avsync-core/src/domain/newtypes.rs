//! Domain newtypes with validation
//!
//! This module provides strongly-typed wrappers for domain identifiers.
//! Local entities (brands, models, records, photos) use UUID-backed ids;
//! marketplace entities use the external system's numeric ids; listings
//! use the external system's opaque listing id, which is the sole dedupe
//! key of the whole pipeline.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

// ============================================================================
// UUID-based local ID types
// ============================================================================

/// Identifier for a locally known brand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BrandId(Uuid);

impl BrandId {
    /// Create a new random BrandId
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a BrandId from an existing UUID
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID value
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for BrandId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for BrandId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BrandId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| DomainError::InvalidId(format!("Invalid BrandId: {e}")))
    }
}

impl From<Uuid> for BrandId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Identifier for a locally known model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(Uuid);

impl ModelId {
    /// Create a new random ModelId
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a ModelId from an existing UUID
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID value
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ModelId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ModelId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ModelId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| DomainError::InvalidId(format!("Invalid ModelId: {e}")))
    }
}

impl From<Uuid> for ModelId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Identifier for a persisted mileage car record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Create a new random RecordId
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a RecordId from an existing UUID
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID value
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| DomainError::InvalidId(format!("Invalid RecordId: {e}")))
    }
}

impl From<Uuid> for RecordId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Identifier for a stored photo copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoId(Uuid);

impl PhotoId {
    /// Create a new random PhotoId
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a PhotoId from an existing UUID
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID value
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PhotoId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for PhotoId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PhotoId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| DomainError::InvalidId(format!("Invalid PhotoId: {e}")))
    }
}

impl From<Uuid> for PhotoId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

// ============================================================================
// Marketplace numeric ID types
// ============================================================================

/// Marketplace identifier for a brand
///
/// The marketplace uses small positive integers; zero marks an unset id
/// in exported data and is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct ExternalBrandId(u32);

impl ExternalBrandId {
    /// Create a new ExternalBrandId
    ///
    /// # Errors
    /// Returns `DomainError::InvalidExternalId` if the raw id is zero
    pub fn new(raw: u32) -> Result<Self, DomainError> {
        if raw == 0 {
            return Err(DomainError::InvalidExternalId(
                "brand id must not be zero".to_string(),
            ));
        }
        Ok(Self(raw))
    }

    /// Get the inner numeric value
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl Display for ExternalBrandId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ExternalBrandId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s
            .parse::<u32>()
            .map_err(|e| DomainError::InvalidExternalId(format!("Invalid brand id: {e}")))?;
        Self::new(raw)
    }
}

impl TryFrom<u32> for ExternalBrandId {
    type Error = DomainError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<ExternalBrandId> for u32 {
    fn from(id: ExternalBrandId) -> Self {
        id.0
    }
}

/// Marketplace identifier for a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct ExternalModelId(u32);

impl ExternalModelId {
    /// Create a new ExternalModelId
    ///
    /// # Errors
    /// Returns `DomainError::InvalidExternalId` if the raw id is zero
    pub fn new(raw: u32) -> Result<Self, DomainError> {
        if raw == 0 {
            return Err(DomainError::InvalidExternalId(
                "model id must not be zero".to_string(),
            ));
        }
        Ok(Self(raw))
    }

    /// Get the inner numeric value
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl Display for ExternalModelId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ExternalModelId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s
            .parse::<u32>()
            .map_err(|e| DomainError::InvalidExternalId(format!("Invalid model id: {e}")))?;
        Self::new(raw)
    }
}

impl TryFrom<u32> for ExternalModelId {
    type Error = DomainError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<ExternalModelId> for u32 {
    fn from(id: ExternalModelId) -> Self {
        id.0
    }
}

/// Marketplace identifier for a model generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct ExternalGenerationId(u32);

impl ExternalGenerationId {
    /// Create a new ExternalGenerationId
    ///
    /// # Errors
    /// Returns `DomainError::InvalidExternalId` if the raw id is zero
    pub fn new(raw: u32) -> Result<Self, DomainError> {
        if raw == 0 {
            return Err(DomainError::InvalidExternalId(
                "generation id must not be zero".to_string(),
            ));
        }
        Ok(Self(raw))
    }

    /// Get the inner numeric value
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl Display for ExternalGenerationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ExternalGenerationId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s
            .parse::<u32>()
            .map_err(|e| DomainError::InvalidExternalId(format!("Invalid generation id: {e}")))?;
        Self::new(raw)
    }
}

impl TryFrom<u32> for ExternalGenerationId {
    type Error = DomainError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<ExternalGenerationId> for u32 {
    fn from(id: ExternalGenerationId) -> Self {
        id.0
    }
}

// ============================================================================
// Listing ID (the dedupe key)
// ============================================================================

/// External listing identifier
///
/// The sole dedupe key of the ingestion pipeline: a listing is ingested at
/// most once per ListingId, no matter how often the sync runs. The
/// marketplace serves numeric ids today, but the value is treated as an
/// opaque non-empty string so an id scheme change upstream cannot corrupt
/// dedupe history.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ListingId(String);

impl ListingId {
    /// Create a new ListingId
    ///
    /// Surrounding whitespace is trimmed before storage so that equal ids
    /// always compare equal.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidListingId` if the id is empty or blank
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidListingId(
                "listing id cannot be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ListingId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ListingId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ListingId {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ListingId> for String {
    fn from(id: ListingId) -> Self {
        id.0
    }
}

// ============================================================================
// Tests
// ============================================================================
