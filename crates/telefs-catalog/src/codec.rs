//! Catalog wire format.
//!
//! A snapshot is a UTF-8 JSON array of object-name strings, written compact:
//!
//! ```text
//! ["notes.txt","photos/cat.jpg"]
//! ```
//!
//! Decoding accepts any JSON array of strings, including pretty-printed
//! snapshots. Anything else is a decode error; callers must not treat it as
//! an empty catalog.

use crate::catalog::Catalog;

/// Encoder/decoder for catalog snapshots.
pub struct CatalogCodec;

impl CatalogCodec {
    /// Encode a catalog as a compact JSON array.
    pub fn encode(catalog: &Catalog) -> Result<Vec<u8>, serde_json::Error> {
        let names: Vec<&str> = catalog.names().collect();
        serde_json::to_vec(&names)
    }

    /// Decode a snapshot. Repeated names collapse to their first position.
    pub fn decode(data: &[u8]) -> Result<Catalog, serde_json::Error> {
        let names: Vec<String> = serde_json::from_slice(data)?;
        Ok(Catalog::from_names(names))
    }
}
