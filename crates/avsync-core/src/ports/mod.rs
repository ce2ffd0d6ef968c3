//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IMarketplaceProvider`] - Remote marketplace queries (generations, last-sold listings)
//! - [`IRecordStore`] - Catalog reads and mileage car record persistence
//! - [`IPhotoImporter`] - Best-effort re-hosting of listing photos

pub mod marketplace_provider;
pub mod photo_importer;
pub mod record_store;

pub use marketplace_provider::IMarketplaceProvider;
pub use photo_importer::{IPhotoImporter, PhotoNamingContext};
pub use record_store::IRecordStore;
