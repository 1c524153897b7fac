//! The [`ChannelTransport`] trait defining the channel interface.
//!
//! A channel can do three things: accept a named document, report its recent
//! history, and hand back the bytes of a document it accepted earlier. It has
//! no rename, delete, or "current pointer" primitive.

use async_trait::async_trait;
use telefs_types::{BlobRef, MessageDescriptor};

use crate::context::OpContext;
use crate::error::TransportResult;

/// The outcome of [`ChannelTransport::scan_recent`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanResult {
    /// Document messages in the window, oldest first, newest last.
    pub descriptors: Vec<MessageDescriptor>,
    /// The raw window was full, so older history may exist beyond it.
    ///
    /// Counted before any filtering: a window filled with text posts or
    /// other chats' messages is truncated even if `descriptors` is short.
    pub truncated: bool,
}

impl ScanResult {
    pub fn new(descriptors: Vec<MessageDescriptor>, truncated: bool) -> Self {
        Self {
            descriptors,
            truncated,
        }
    }
}

/// Storage substrate for telefs.
///
/// Implementations must be thread-safe (`Send + Sync`). Every call takes the
/// caller's [`OpContext`] and must stop promptly once it is cancelled or its
/// deadline passes.
#[async_trait]
pub trait ChannelTransport: Send + Sync {
    /// Send `bytes` as a document named `name`.
    ///
    /// Returns the descriptor of the message that now carries the document.
    async fn upload_blob(
        &self,
        ctx: &OpContext,
        name: &str,
        bytes: &[u8],
    ) -> TransportResult<MessageDescriptor>;

    /// Report up to `limit` of the most recent document messages.
    ///
    /// Descriptors come back oldest first, newest last, for every
    /// implementation. Each call is a fresh, finite snapshot; nothing beyond
    /// `limit` is reachable, and [`ScanResult::truncated`] says whether the
    /// window cut anything off.
    async fn scan_recent(&self, ctx: &OpContext, limit: usize) -> TransportResult<ScanResult>;

    /// Fetch the bytes of a previously uploaded document.
    ///
    /// Fails with [`TransportError::NotFound`](crate::TransportError::NotFound)
    /// when the reference has expired or is unknown.
    async fn download_blob(&self, ctx: &OpContext, blob: &BlobRef) -> TransportResult<Vec<u8>>;
}

#[async_trait]
impl<T: ChannelTransport + ?Sized> ChannelTransport for std::sync::Arc<T> {
    async fn upload_blob(
        &self,
        ctx: &OpContext,
        name: &str,
        bytes: &[u8],
    ) -> TransportResult<MessageDescriptor> {
        (**self).upload_blob(ctx, name, bytes).await
    }

    async fn scan_recent(&self, ctx: &OpContext, limit: usize) -> TransportResult<ScanResult> {
        (**self).scan_recent(ctx, limit).await
    }

    async fn download_blob(&self, ctx: &OpContext, blob: &BlobRef) -> TransportResult<Vec<u8>> {
        (**self).download_blob(ctx, blob).await
    }
}
