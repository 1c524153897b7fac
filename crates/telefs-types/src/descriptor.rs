//! Channel-level identifiers.
//!
//! A history scan yields [`MessageDescriptor`]s. The descriptor of the most
//! recent catalog snapshot doubles as the [`CatalogVersion`] that writers
//! compare against before publishing.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Channel-assigned message position.
///
/// Message ids grow with every message sent to a channel, so they order
/// descriptors within one channel. They carry no meaning across channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque transport-assigned handle to previously uploaded content.
///
/// Only valid for download. Not comparable across channels.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobRef(String);

impl BlobRef {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form for log lines (first 12 characters).
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(12) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl fmt::Debug for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobRef({})", self.short())
    }
}

impl fmt::Display for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A document-carrying message as reported by a channel history scan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDescriptor {
    /// Position of the message in its channel.
    pub message_id: MessageId,
    /// The file name the document was sent under.
    pub name: String,
    /// Handle for downloading the document.
    pub blob: BlobRef,
}

impl MessageDescriptor {
    pub fn new(message_id: MessageId, name: impl Into<String>, blob: BlobRef) -> Self {
        Self {
            message_id,
            name: name.into(),
            blob,
        }
    }
}

/// Identifies the channel message that holds the latest catalog snapshot.
///
/// Two versions are the same version when they name the same message; the
/// blob handle is carried along for downloading and is ignored by equality.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogVersion {
    pub message_id: MessageId,
    pub blob: BlobRef,
}

impl CatalogVersion {
    pub fn new(message_id: MessageId, blob: BlobRef) -> Self {
        Self { message_id, blob }
    }
}

impl PartialEq for CatalogVersion {
    fn eq(&self, other: &Self) -> bool {
        self.message_id == other.message_id
    }
}

impl Eq for CatalogVersion {}

impl From<&MessageDescriptor> for CatalogVersion {
    fn from(descriptor: &MessageDescriptor) -> Self {
        Self::new(descriptor.message_id, descriptor.blob.clone())
    }
}

impl fmt::Display for CatalogVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message_id, self.blob.short())
    }
}
