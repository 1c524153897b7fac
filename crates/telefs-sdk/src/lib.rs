//! High-level telefs API.
//!
//! [`TeleFs`] stores named objects on a Telegram channel and lists them
//! through a catalog kept on the same channel. It supports exactly two
//! operations, [`Putter::put`] and [`Lister::list`]; per-object access is
//! refused through [`RandomAccessObject`].
//!
//! ```no_run
//! # async fn demo() -> telefs_sdk::FsResult<()> {
//! use telefs_sdk::{OpContext, TeleFs, TelefsConfig};
//!
//! let fs = TeleFs::connect(&TelefsConfig::from_env())?;
//! let ctx = OpContext::new();
//! fs.put(&ctx, "notes/today.txt", b"hello").await?;
//! for record in fs.list(&ctx, "notes/").await? {
//!     println!("{record}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod capability;
pub mod config;
pub mod error;
pub mod fs;
pub mod object;

pub use capability::{Capabilities, HashKind, Lister, Operation, Putter, RandomAccessObject};
pub use config::TelefsConfig;
pub use error::{FsError, FsResult};
pub use fs::{TeleFs, TelegramStack};
pub use object::ObjectHandle;

// Re-export key types
pub use telefs_catalog::{Catalog, CatalogConfig, CatalogError, LoadedCatalog};
pub use telefs_transport::{InMemoryChannel, OpContext, TransportError};
pub use telefs_types::{BlobRef, CatalogVersion, MessageId, ObjectRecord, CATALOG_NAME};
