//! avsync photos - listing photo re-hosting
//!
//! Downloads listing photos from the marketplace CDN and stores local
//! copies under a configured directory, one file per photo, named after
//! the listing's descriptive context.
//!
//! Import is strictly best effort: URLs that fail to download or write
//! are skipped, and the ids of the photos that did get stored are
//! returned.
//!
//! ## Modules
//!
//! - [`importer`] - `IPhotoImporter` implementation over reqwest + tokio::fs

pub mod importer;

pub use importer::FilePhotoImporter;
