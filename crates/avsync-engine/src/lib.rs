//! avsync Engine - Catalog crawl orchestration
//!
//! Provides:
//! - One-pass traversal of the crawl catalog against the marketplace
//! - Listing-id dedupe so repeated passes never duplicate records
//! - Best-effort photo import for newly ingested listings
//! - Per-step failure isolation with a structured run report
//!
//! ## Modules
//!
//! - [`engine`] - The [`SyncEngine`] and its catalog traversal

pub mod engine;

pub use engine::SyncEngine;
