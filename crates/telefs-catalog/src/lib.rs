//! Catalog synchronization for telefs.
//!
//! The catalog is the ordered list of every object name a telefs channel
//! holds. It is persisted as a JSON snapshot named `filelist.json`, and every
//! change uploads a whole new snapshot. The newest snapshot in the channel's
//! recent history is the current catalog.
//!
//! # Modules
//!
//! - [`catalog`] -- [`Catalog`] and [`CatalogDelta`], the in-memory model
//! - [`codec`] -- [`CatalogCodec`], the snapshot wire format
//! - [`store`] -- [`CatalogStore`], lookup and compare-and-retry publishing
//! - [`config`] -- [`CatalogConfig`]
//! - [`error`] -- [`CatalogError`]

pub mod catalog;
pub mod codec;
pub mod config;
pub mod error;
pub mod store;

pub use catalog::{Catalog, CatalogDelta};
pub use codec::CatalogCodec;
pub use config::CatalogConfig;
pub use error::{CatalogError, CatalogResult};
pub use store::{CatalogStore, LoadedCatalog, Published};
