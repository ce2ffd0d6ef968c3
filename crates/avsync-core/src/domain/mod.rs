//! Domain entities and business logic
//!
//! This module contains the core domain types for avsync:
//! - Newtypes for type-safe identifiers
//! - Catalog entries (the locally known brand/model pairs)
//! - Marketplace generations and their model-year enumeration
//! - Last-sold listings and fail-soft property access
//! - The persisted mileage car record and its typed builder
//! - Sync reports with per-step issue capture
//! - Domain-specific error types

pub mod catalog;
pub mod errors;
pub mod generation;
pub mod listing;
pub mod newtypes;
pub mod record;
pub mod report;

// Re-export commonly used types
pub use catalog::CatalogEntry;
pub use errors::DomainError;
pub use generation::Generation;
pub use listing::{LastSoldListing, ListingProperty};
pub use newtypes::*;
pub use record::{MileageCarRecord, RecordSource};
pub use report::{SyncIssue, SyncReport, SyncStage};
