//! Backoff layer over any [`ChannelTransport`].
//!
//! Rate limits and transient network failures are retried with exponential
//! backoff and jitter. Credential rejections, missing blobs, cancellation and
//! deadlines are returned to the caller on the first occurrence.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use telefs_types::{BlobRef, MessageDescriptor};
use tracing::{debug, warn};

use crate::config::RetryConfig;
use crate::context::OpContext;
use crate::error::TransportResult;
use crate::traits::{ChannelTransport, ScanResult};

/// Wraps a transport and retries its retryable failures.
///
/// A retried upload whose first attempt reached the channel before the
/// connection broke leaves a duplicate message behind. Duplicate object
/// blobs are unreachable, and a duplicate catalog snapshot carries the same
/// content as the original, so neither changes what `list` reports.
#[derive(Debug)]
pub struct RetryingTransport<T> {
    inner: T,
    config: RetryConfig,
}

impl<T: ChannelTransport> RetryingTransport<T> {
    pub fn new(inner: T, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    fn jittered(&self, retry: u32) -> Duration {
        let base = self.config.backoff_for(retry);
        let factor: f64 = rand::thread_rng().gen_range(0.5..=1.0);
        base.mul_f64(factor)
    }

    async fn retrying<R, F, Fut>(&self, ctx: &OpContext, op: &'static str, mut call: F) -> TransportResult<R>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = TransportResult<R>> + Send,
        R: Send,
    {
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(op, attempt, "transport call succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) if err.is_retryable() && attempt < self.config.max_attempts => {
                    let pause = err.retry_after().unwrap_or_else(|| self.jittered(attempt));
                    warn!(
                        op,
                        attempt,
                        error = %err,
                        pause_ms = pause.as_millis() as u64,
                        "retrying transport call"
                    );
                    ctx.sleep(pause).await?;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[async_trait]
impl<T: ChannelTransport> ChannelTransport for RetryingTransport<T> {
    async fn upload_blob(
        &self,
        ctx: &OpContext,
        name: &str,
        bytes: &[u8],
    ) -> TransportResult<MessageDescriptor> {
        self.retrying(ctx, "upload_blob", || self.inner.upload_blob(ctx, name, bytes))
            .await
    }

    async fn scan_recent(&self, ctx: &OpContext, limit: usize) -> TransportResult<ScanResult> {
        self.retrying(ctx, "scan_recent", || self.inner.scan_recent(ctx, limit))
            .await
    }

    async fn download_blob(&self, ctx: &OpContext, blob: &BlobRef) -> TransportResult<Vec<u8>> {
        self.retrying(ctx, "download_blob", || self.inner.download_blob(ctx, blob))
            .await
    }
}
