//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! mostly validation failures raised by newtype constructors and the
//! record builder.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// UUID parsing error for local identifiers
    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    /// Invalid external listing identifier
    #[error("Invalid listing ID: {0}")]
    InvalidListingId(String),

    /// Invalid marketplace identifier (brand, model or generation)
    #[error("Invalid marketplace ID: {0}")]
    InvalidExternalId(String),

    /// A catalog entry without marketplace identifiers cannot produce records
    #[error("Catalog entry '{brand} {model}' has no marketplace identifiers")]
    EntryNotCrawlable {
        /// Local brand name
        brand: String,
        /// Local model name
        model: String,
    },
}
