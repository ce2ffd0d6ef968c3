//! avsync Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `CatalogEntry`, `Generation`, `LastSoldListing`, `MileageCarRecord`
//! - **Sync reporting** - `SyncReport` with per-step issue capture
//! - **Port definitions** - Traits for adapters: `IMarketplaceProvider`, `IRecordStore`, `IPhotoImporter`
//! - **Configuration** - Typed YAML configuration with validation
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure business logic with no external dependencies.
//! Ports define trait interfaces that adapter crates implement. The sync
//! engine crate orchestrates domain entities through the port interfaces.

pub mod config;
pub mod domain;
pub mod ports;
