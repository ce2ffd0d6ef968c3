//! avsync av.by - marketplace API adapter
//!
//! Provides the async client for the public av.by car marketplace API:
//! - Generation catalog lookups per (brand, model)
//! - Last-sold listing queries per (brand, model, generation, year)
//!
//! ## Modules
//!
//! - [`client`] - Typed HTTP client for the av.by endpoints
//! - [`provider`] - `IMarketplaceProvider` implementation mapping wire DTOs
//!   to domain types

pub mod client;
pub mod provider;

pub use client::AvbyClient;
pub use provider::AvbyMarketplaceProvider;
