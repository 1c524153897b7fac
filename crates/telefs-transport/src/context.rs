//! Per-operation deadline and cancellation.
//!
//! Every transport call runs under an [`OpContext`]. Cancelling the context
//! or letting its deadline pass drops the in-flight future, which aborts the
//! underlying HTTP request instead of leaving it running in the background.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{TransportError, TransportResult};

/// Deadline and cancellation signal for one public operation.
#[derive(Clone, Debug, Default)]
pub struct OpContext {
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl OpContext {
    /// A context with no deadline that is only cancelled explicitly.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new().deadline_in(timeout)
    }

    /// Set (or tighten) the deadline to `timeout` from now.
    pub fn deadline_in(mut self, timeout: Duration) -> Self {
        let at = Instant::now() + timeout;
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < at => existing,
            _ => at,
        });
        self
    }

    /// Derive a context that is cancelled together with `self` but can also
    /// be cancelled on its own.
    pub fn child(&self) -> Self {
        Self {
            deadline: self.deadline,
            cancel: self.cancel.child_token(),
        }
    }

    /// Cancel this context and every child derived from it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fail fast if the context is already done.
    pub fn check(&self) -> TransportResult<()> {
        if self.is_cancelled() {
            return Err(TransportError::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(TransportError::DeadlineExceeded);
            }
        }
        Ok(())
    }

    /// Drive `fut` to completion unless the context is cancelled or its
    /// deadline passes first.
    pub async fn run<F, T>(&self, fut: F) -> TransportResult<T>
    where
        F: Future<Output = TransportResult<T>>,
    {
        self.check()?;
        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = self.cancel.cancelled() => Err(TransportError::Cancelled),
                _ = tokio::time::sleep_until(deadline) => Err(TransportError::DeadlineExceeded),
                out = fut => out,
            },
            None => tokio::select! {
                _ = self.cancel.cancelled() => Err(TransportError::Cancelled),
                out = fut => out,
            },
        }
    }

    /// Sleep for `duration`, waking early with an error if the context ends.
    pub async fn sleep(&self, duration: Duration) -> TransportResult<()> {
        self.run(async {
            tokio::time::sleep(duration).await;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn run_passes_through_result() {
        let ctx = OpContext::new();
        let out = ctx.run(async { Ok::<_, TransportError>(7) }).await.unwrap();
        assert_eq!(out, 7);
    }

    #[tokio::test]
    async fn cancelled_context_fails_fast() {
        let ctx = OpContext::new();
        ctx.cancel();
        let err = ctx.run(async { Ok::<_, TransportError>(()) }).await.unwrap_err();
        assert!(matches!(err, TransportError::Cancelled));
    }

    #[tokio::test]
    async fn cancel_aborts_pending_future() {
        let ctx = OpContext::new();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });
        let err = ctx
            .run(std::future::pending::<TransportResult<()>>())
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_aborts_pending_future() {
        let ctx = OpContext::with_timeout(Duration::from_secs(5));
        let err = ctx
            .run(std::future::pending::<TransportResult<()>>())
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn child_follows_parent_cancel() {
        let parent = OpContext::new();
        let child = parent.child();
        parent.cancel();
        assert!(child.is_cancelled());

        let parent = OpContext::new();
        let child = parent.child();
        child.cancel();
        assert!(!parent.is_cancelled());
    }

    #[test]
    fn deadline_only_tightens() {
        let ctx = OpContext::with_timeout(Duration::from_secs(1));
        let first = ctx.deadline().unwrap();
        let ctx = ctx.deadline_in(Duration::from_secs(60));
        assert_eq!(ctx.deadline().unwrap(), first);
    }
}
