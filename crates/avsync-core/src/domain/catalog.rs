//! Catalog entries
//!
//! A [`CatalogEntry`] is one locally known (brand, model) pair, together
//! with the marketplace's own identifiers for the same pair. Only entries
//! carrying both marketplace identifiers can be crawled; the rest exist in
//! the catalog (for manually entered vehicles, say) but are skipped by the
//! sync traversal.

use serde::{Deserialize, Serialize};

use super::newtypes::{BrandId, ExternalBrandId, ExternalModelId, ModelId};

/// A locally known (brand, model) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Local brand identifier
    pub brand_id: BrandId,
    /// Local model identifier
    pub model_id: ModelId,
    /// Brand display name, e.g. "Audi"
    pub brand_name: String,
    /// Model display name, e.g. "A4"
    pub model_name: String,
    /// Marketplace brand identifier, if mapped
    pub external_brand: Option<ExternalBrandId>,
    /// Marketplace model identifier, if mapped
    pub external_model: Option<ExternalModelId>,
}

impl CatalogEntry {
    /// Both marketplace identifiers, when the entry is crawlable
    ///
    /// Returns `None` when either identifier is missing; such entries are
    /// skipped silently by the traversal.
    #[must_use]
    pub fn marketplace_ids(&self) -> Option<(ExternalBrandId, ExternalModelId)> {
        match (self.external_brand, self.external_model) {
            (Some(brand), Some(model)) => Some((brand, model)),
            _ => None,
        }
    }

    /// Human-readable "Brand Model" label for logs and issue subjects
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} {}", self.brand_name, self.model_name)
    }
}
