//! In-memory channel for testing and ephemeral use.
//!
//! [`InMemoryChannel`] keeps an append-only message log behind a `Mutex` and
//! implements the full [`ChannelTransport`] trait. It also supports fault
//! injection so failure paths above the transport can be exercised.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use telefs_types::{BlobRef, MessageDescriptor, MessageId};

use crate::context::OpContext;
use crate::error::{TransportError, TransportResult};
use crate::traits::{ChannelTransport, ScanResult};

/// The kind of failure an injected fault produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaultKind {
    Network,
    RateLimited,
    Auth,
}

impl FaultKind {
    fn to_error(self) -> TransportError {
        match self {
            FaultKind::Network => TransportError::Network("injected network fault".into()),
            FaultKind::RateLimited => TransportError::RateLimited {
                retry_after: Some(Duration::from_millis(1)),
            },
            FaultKind::Auth => TransportError::Auth("injected credential rejection".into()),
        }
    }
}

#[derive(Debug)]
struct Fault {
    /// Only uploads with this name trip the fault; `None` matches every upload.
    name: Option<String>,
    remaining: usize,
    kind: FaultKind,
}

#[derive(Debug, Default)]
struct ChannelState {
    next_id: i64,
    log: Vec<MessageDescriptor>,
    blobs: HashMap<BlobRef, Vec<u8>>,
    faults: Vec<Fault>,
    uploads: usize,
}

/// An in-memory implementation of [`ChannelTransport`].
///
/// Message ids start at 1 and grow by one per upload. Data is lost when the
/// channel is dropped.
#[derive(Debug, Default)]
pub struct InMemoryChannel {
    state: Mutex<ChannelState>,
    latency: Option<Duration>,
}

impl InMemoryChannel {
    /// Create a new empty channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call by `latency`, so callers overlap the way they do
    /// against a remote channel.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail the next `count` uploads with `kind`.
    pub fn fail_next_uploads(&self, count: usize, kind: FaultKind) {
        self.lock().faults.push(Fault {
            name: None,
            remaining: count,
            kind,
        });
    }

    /// Fail the next `count` uploads of documents named `name` with `kind`.
    pub fn fail_uploads_named(&self, name: &str, count: usize, kind: FaultKind) {
        self.lock().faults.push(Fault {
            name: Some(name.to_string()),
            remaining: count,
            kind,
        });
    }

    /// Forget the content behind `blob`, as if the channel expired it.
    pub fn expire_blob(&self, blob: &BlobRef) -> bool {
        self.lock().blobs.remove(blob).is_some()
    }

    /// All messages ever sent, oldest first.
    pub fn messages(&self) -> Vec<MessageDescriptor> {
        self.lock().log.clone()
    }

    /// Messages sent under `name`, oldest first.
    pub fn messages_named(&self, name: &str) -> Vec<MessageDescriptor> {
        self.lock()
            .log
            .iter()
            .filter(|d| d.name == name)
            .cloned()
            .collect()
    }

    /// Number of messages in the channel.
    pub fn len(&self) -> usize {
        self.lock().log.len()
    }

    /// Returns `true` if nothing was ever sent.
    pub fn is_empty(&self) -> bool {
        self.lock().log.is_empty()
    }

    /// Number of successful uploads.
    pub fn upload_count(&self) -> usize {
        self.lock().uploads
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ChannelState> {
        // A panic while holding the lock cannot leave the log half-written:
        // every mutation is a single push or insert.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn simulate_latency(&self, ctx: &OpContext) -> TransportResult<()> {
        match self.latency {
            Some(latency) => ctx.sleep(latency).await,
            None => {
                tokio::task::yield_now().await;
                ctx.check()
            }
        }
    }

    fn take_fault(state: &mut ChannelState, name: &str) -> Option<TransportError> {
        let fault = state.faults.iter_mut().find(|f| {
            f.remaining > 0 && f.name.as_deref().map_or(true, |n| n == name)
        })?;
        fault.remaining -= 1;
        let err = fault.kind.to_error();
        state.faults.retain(|f| f.remaining > 0);
        Some(err)
    }
}

#[async_trait]
impl ChannelTransport for InMemoryChannel {
    async fn upload_blob(
        &self,
        ctx: &OpContext,
        name: &str,
        bytes: &[u8],
    ) -> TransportResult<MessageDescriptor> {
        self.simulate_latency(ctx).await?;

        let mut state = self.lock();
        if let Some(err) = Self::take_fault(&mut state, name) {
            return Err(err);
        }

        state.next_id += 1;
        let message_id = MessageId(state.next_id);
        let blob = BlobRef::new(format!("mem-{}", message_id.0));
        let descriptor = MessageDescriptor::new(message_id, name, blob.clone());
        state.blobs.insert(blob, bytes.to_vec());
        state.log.push(descriptor.clone());
        state.uploads += 1;
        Ok(descriptor)
    }

    async fn scan_recent(&self, ctx: &OpContext, limit: usize) -> TransportResult<ScanResult> {
        self.simulate_latency(ctx).await?;

        let state = self.lock();
        let start = state.log.len().saturating_sub(limit);
        Ok(ScanResult::new(state.log[start..].to_vec(), start > 0))
    }

    async fn download_blob(&self, ctx: &OpContext, blob: &BlobRef) -> TransportResult<Vec<u8>> {
        self.simulate_latency(ctx).await?;

        self.lock()
            .blobs
            .get(blob)
            .cloned()
            .ok_or_else(|| TransportError::NotFound(format!("blob {}", blob.short())))
    }
}
