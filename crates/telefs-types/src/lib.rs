//! Foundation types for telefs.
//!
//! telefs stores objects on a message channel that can only send named
//! documents and scan recent history. This crate holds the vocabulary every
//! other telefs crate shares.
//!
//! # Key Types
//!
//! - [`ObjectRecord`] -- a catalog entry (object name only)
//! - [`BlobRef`] -- opaque transport-assigned handle to uploaded content
//! - [`MessageId`] -- channel-assigned message position
//! - [`MessageDescriptor`] -- `(message id, declared name, blob)` from a history scan
//! - [`CatalogVersion`] -- optimistic-concurrency token naming the latest catalog
//! - [`CATALOG_NAME`] -- the reserved name catalog snapshots are sent under

pub mod descriptor;
pub mod error;
pub mod names;
pub mod record;

pub use descriptor::{BlobRef, CatalogVersion, MessageDescriptor, MessageId};
pub use error::TypeError;
pub use names::{is_reserved_name, validate_object_name, CATALOG_NAME, MAX_NAME_LEN};
pub use record::ObjectRecord;
