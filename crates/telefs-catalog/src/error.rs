//! Error types for catalog operations.

use telefs_transport::TransportError;
use telefs_types::{BlobRef, CatalogVersion};
use thiserror::Error;

/// Errors that can occur while reading or publishing the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The channel call underneath failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The latest snapshot could not be decoded. Never treated as empty.
    #[error("corrupt catalog {blob}: {reason}")]
    Corrupt { blob: BlobRef, reason: String },

    /// A newer snapshot appeared since `expected` was read.
    #[error("catalog moved: expected {}, found {}", show(.expected), show(.found))]
    Stale {
        expected: Option<CatalogVersion>,
        found: Option<CatalogVersion>,
    },

    /// Concurrent writers kept winning; the publish gave up.
    #[error("catalog conflict not resolved after {attempts} attempts")]
    Conflict { attempts: u32 },

    /// Our snapshot `version` was published, but snapshots from other writers
    /// kept landing before it and the merge budget ran out. Entries from
    /// those writers may be missing from the latest catalog.
    #[error("published {version} but could not fold in racing snapshots after {repairs} merge rounds")]
    Unreconciled { version: CatalogVersion, repairs: u32 },

    /// A full lookback window held no snapshot, so the latest one may simply
    /// be older than the window.
    #[error("no catalog within the last {window} messages")]
    WindowExhausted { window: usize },

    /// The catalog could not be serialized.
    #[error("catalog encode error: {0}")]
    Encode(String),
}

fn show(version: &Option<CatalogVersion>) -> String {
    match version {
        Some(v) => v.to_string(),
        None => "no catalog".into(),
    }
}

impl CatalogError {
    /// Whether this error came from the channel rejecting our credentials.
    pub fn is_auth(&self) -> bool {
        matches!(self, CatalogError::Transport(TransportError::Auth(_)))
    }
}

/// Convenience type alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;
