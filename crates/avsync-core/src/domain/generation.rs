//! Marketplace model generations
//!
//! A [`Generation`] is the marketplace's production-era grouping of a
//! model, spanning a model-year range. The range drives the year
//! enumeration of the sync traversal:
//!
//! - bounded generations enumerate `year_from..=year_to` inclusive;
//! - open-ended generations (still in production) enumerate up to the
//!   current calendar year, supplied by the caller at traversal time;
//! - generations without `year_from` cannot be enumerated at all and are
//!   skipped.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use super::newtypes::ExternalGenerationId;

/// A marketplace model generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generation {
    /// Marketplace generation identifier
    pub id: ExternalGenerationId,
    /// Display name, e.g. "B9 (IV)"
    pub name: String,
    /// First model year, absent for generations the marketplace cannot date
    pub year_from: Option<i32>,
    /// Last model year, absent while the generation is still in production
    pub year_to: Option<i32>,
}

impl Generation {
    /// The model years this generation spans, for year-by-year queries
    ///
    /// `current_year` caps open-ended generations and must be evaluated at
    /// traversal time, not cached across a long-running process. Returns
    /// `None` when `year_from` is absent. An inverted range (bad upstream
    /// data) yields an empty iterator rather than an error.
    #[must_use]
    pub fn model_years(&self, current_year: i32) -> Option<RangeInclusive<i32>> {
        let from = self.year_from?;
        let to = self.year_to.unwrap_or(current_year);
        Some(from..=to)
    }
}
