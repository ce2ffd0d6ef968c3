//! Marketplace provider port (driven/secondary port)
//!
//! This module defines the interface for querying the remote car
//! marketplace. The primary implementation targets av.by, but the trait
//! only speaks in domain types so other marketplaces could slot in.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because errors at port boundaries are
//!   adapter-specific (HTTP statuses, decode failures) and don't need
//!   domain-level classification. The orchestrator treats an `Err` as
//!   "nothing found here", records the cause, and moves on.
//! - "No data for this combination" is not an error: implementations
//!   return an empty `Vec` for it.

use crate::domain::generation::Generation;
use crate::domain::listing::LastSoldListing;
use crate::domain::newtypes::{ExternalBrandId, ExternalGenerationId, ExternalModelId};

/// Port trait for the remote marketplace catalog
#[async_trait::async_trait]
pub trait IMarketplaceProvider: Send + Sync {
    /// Lists the generations of one marketplace model
    ///
    /// Returns an empty `Vec` when the marketplace has no generations for
    /// the pair.
    async fn list_generations(
        &self,
        brand: ExternalBrandId,
        model: ExternalModelId,
    ) -> anyhow::Result<Vec<Generation>>;

    /// Lists the last-sold listings for one (generation, model year) query
    ///
    /// Returns an empty `Vec` when nothing was sold for the combination.
    async fn list_last_sold(
        &self,
        brand: ExternalBrandId,
        model: ExternalModelId,
        generation: ExternalGenerationId,
        year: i32,
    ) -> anyhow::Result<Vec<LastSoldListing>>;
}
