//! Last-sold listings
//!
//! A [`LastSoldListing`] is one completed-sale record returned by the
//! marketplace's price-statistics endpoint, the unit of ingestion.
//! Descriptive fields arrive as a loose name/value list whose exact
//! contents vary by vehicle; lookups fail soft (return `None`) so a
//! listing missing, say, its "brand" property still flows through the
//! pipeline with a degraded photo naming context instead of erroring.

use serde::{Deserialize, Serialize};

use super::newtypes::ListingId;

/// One named descriptive field of a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingProperty {
    /// Field name as published by the marketplace, e.g. "brand"
    pub name: String,
    /// Field value, normalized to a string
    pub value: String,
}

/// A single last-sold record from the marketplace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastSoldListing {
    /// External listing id, the dedupe key
    pub external_id: ListingId,
    /// Descriptive fields keyed by name
    pub properties: Vec<ListingProperty>,
    /// Raw photo URLs, retained whether or not photos get imported
    pub photo_urls: Vec<String>,
}

impl LastSoldListing {
    /// Look up a descriptive field by name; first match wins
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    /// Brand name as the marketplace published it
    #[must_use]
    pub fn brand_name(&self) -> Option<&str> {
        self.property("brand")
    }

    /// Model name as the marketplace published it
    #[must_use]
    pub fn model_name(&self) -> Option<&str> {
        self.property("model")
    }
}
