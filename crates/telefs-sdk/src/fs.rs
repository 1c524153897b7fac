use async_trait::async_trait;
use telefs_catalog::{CatalogConfig, CatalogStore, LoadedCatalog};
use telefs_transport::{ChannelTransport, OpContext, RetryingTransport, TelegramTransport};
use telefs_types::{validate_object_name, ObjectRecord};
use tracing::{debug, info};

use crate::capability::{Capabilities, Lister, Putter};
use crate::config::TelefsConfig;
use crate::error::{FsError, FsResult};
use crate::object::ObjectHandle;

/// The transport stack [`TeleFs::connect`] builds.
pub type TelegramStack = RetryingTransport<TelegramTransport>;

/// Object storage on a channel.
///
/// Object content goes to the channel as one document per `put`; the list
/// of names lives in the catalog snapshots managed by [`CatalogStore`].
/// `TeleFs` keeps no state between calls, so any number of instances, in
/// any number of processes, can share one channel.
#[derive(Debug)]
pub struct TeleFs<T> {
    store: CatalogStore<T>,
}

impl TeleFs<TelegramStack> {
    /// Build a Bot API client with retries from `config`.
    pub fn connect(config: &TelefsConfig) -> FsResult<Self> {
        config.validate()?;
        let telegram = TelegramTransport::new(config.telegram())?;
        let transport = RetryingTransport::new(telegram, config.retry());
        info!(
            chat = %config.chat_id,
            api_base = %config.api_base,
            "connected to channel"
        );
        Ok(Self::new(transport, config.catalog()))
    }
}

impl<T: ChannelTransport> TeleFs<T> {
    pub fn new(transport: T, config: CatalogConfig) -> Self {
        Self {
            store: CatalogStore::new(transport, config),
        }
    }

    pub fn transport(&self) -> &T {
        self.store.transport()
    }

    pub fn catalog_store(&self) -> &CatalogStore<T> {
        &self.store
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            put: true,
            list: true,
            random_access: false,
            hashes: Vec::new(),
        }
    }

    /// Store `data` under `name` and add the name to the catalog.
    ///
    /// If the content upload fails the catalog is not touched. If the
    /// catalog publish fails the uploaded blob stays on the channel,
    /// unlisted. That includes refusing to publish when the lookback window
    /// holds no snapshot but older history does.
    pub async fn put(&self, ctx: &OpContext, name: &str, data: &[u8]) -> FsResult<ObjectHandle> {
        validate_object_name(name)?;

        let descriptor = self.transport().upload_blob(ctx, name, data).await?;
        debug!(name = %name, message_id = %descriptor.message_id, size = data.len(), "uploaded object");

        let published = self.store.append(ctx, name).await?;
        info!(
            name = %name,
            catalog = %published.version,
            attempts = published.attempts,
            "stored object"
        );

        Ok(ObjectHandle::uploaded(
            name,
            descriptor.blob,
            descriptor.message_id,
            data.len() as u64,
        ))
    }

    /// Catalog records whose name starts with `prefix`, in publish order.
    pub async fn list(&self, ctx: &OpContext, prefix: &str) -> FsResult<Vec<ObjectRecord>> {
        let loaded = self.store.load_latest(ctx).await?;
        let records = loaded.catalog.filter_prefix(prefix);
        debug!(prefix = %prefix, matched = records.len(), total = loaded.catalog.len(), "listed catalog");
        Ok(records)
    }

    /// A handle for a listed object.
    pub async fn object(&self, ctx: &OpContext, name: &str) -> FsResult<ObjectHandle> {
        let loaded = self.store.load_latest(ctx).await?;
        if loaded.catalog.contains(name) {
            Ok(ObjectHandle::new(name))
        } else {
            Err(FsError::NotListed(name.to_string()))
        }
    }

    /// The latest catalog with its version and window status.
    pub async fn catalog(&self, ctx: &OpContext) -> FsResult<LoadedCatalog> {
        Ok(self.store.load_latest(ctx).await?)
    }
}

#[async_trait]
impl<T: ChannelTransport> Putter for TeleFs<T> {
    async fn put(&self, ctx: &OpContext, name: &str, data: &[u8]) -> FsResult<ObjectHandle> {
        TeleFs::put(self, ctx, name, data).await
    }
}

#[async_trait]
impl<T: ChannelTransport> Lister for TeleFs<T> {
    async fn list(&self, ctx: &OpContext, prefix: &str) -> FsResult<Vec<ObjectRecord>> {
        TeleFs::list(self, ctx, prefix).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use telefs_catalog::CatalogError;
    use telefs_transport::{FaultKind, InMemoryChannel, TransportError};
    use telefs_types::CATALOG_NAME;

    use super::*;
    use crate::capability::{Operation, RandomAccessObject};

    type MemFs = TeleFs<Arc<InMemoryChannel>>;

    fn ctx() -> OpContext {
        OpContext::new()
    }

    fn fs() -> MemFs {
        TeleFs::new(Arc::new(InMemoryChannel::new()), CatalogConfig::default())
    }

    fn names(records: &[ObjectRecord]) -> Vec<&str> {
        records.iter().map(|r| r.name()).collect()
    }

    #[tokio::test]
    async fn put_then_list_round_trip() {
        let fs = fs();
        let handle = fs.put(&ctx(), "a.txt", b"hello").await.unwrap();
        assert_eq!(handle.size, Some(5));

        let listed = fs.list(&ctx(), "").await.unwrap();
        assert_eq!(names(&listed), vec!["a.txt"]);

        let blob = handle.blob.unwrap();
        let bytes = fs.transport().download_blob(&ctx(), &blob).await.unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[tokio::test]
    async fn list_preserves_put_order() {
        let fs = fs();
        for name in ["c", "a", "b"] {
            fs.put(&ctx(), name, name.as_bytes()).await.unwrap();
        }
        assert_eq!(names(&fs.list(&ctx(), "").await.unwrap()), vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn empty_channel_lists_nothing() {
        let fs = fs();
        assert!(fs.list(&ctx(), "").await.unwrap().is_empty());
        assert!(fs.transport().is_empty());
    }

    #[tokio::test]
    async fn list_filters_by_prefix() {
        let fs = fs();
        for name in ["docs/a", "img/b", "docs/c"] {
            fs.put(&ctx(), name, b"x").await.unwrap();
        }
        assert_eq!(names(&fs.list(&ctx(), "docs/").await.unwrap()), vec!["docs/a", "docs/c"]);
        assert!(fs.list(&ctx(), "nope").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_upload_leaves_catalog_untouched() {
        let fs = fs();
        fs.put(&ctx(), "a", b"1").await.unwrap();
        let snapshots = fs.transport().messages_named(CATALOG_NAME).len();
        fs.transport().fail_uploads_named("b", 1, FaultKind::Network);

        let err = fs.put(&ctx(), "b", b"2").await.unwrap_err();
        assert!(matches!(err, FsError::Transport(TransportError::Network(_))));
        assert_eq!(names(&fs.list(&ctx(), "").await.unwrap()), vec!["a"]);
        assert_eq!(fs.transport().messages_named(CATALOG_NAME).len(), snapshots);
    }

    #[tokio::test]
    async fn auth_failure_is_reported_as_auth() {
        let fs = fs();
        fs.transport().fail_next_uploads(1, FaultKind::Auth);
        let err = fs.put(&ctx(), "a", b"1").await.unwrap_err();
        assert!(err.is_auth());
    }

    #[tokio::test]
    async fn corrupt_catalog_fails_list_and_put() {
        let fs = fs();
        fs.transport()
            .upload_blob(&ctx(), CATALOG_NAME, b"<html>")
            .await
            .unwrap();

        let err = fs.list(&ctx(), "").await.unwrap_err();
        assert!(matches!(err, FsError::Catalog(CatalogError::Corrupt { .. })));
        let err = fs.put(&ctx(), "a", b"1").await.unwrap_err();
        assert!(matches!(err, FsError::Catalog(CatalogError::Corrupt { .. })));
    }

    #[tokio::test]
    async fn reserved_name_is_rejected_before_upload() {
        let fs = fs();
        let err = fs.put(&ctx(), CATALOG_NAME, b"[]").await.unwrap_err();
        assert!(matches!(err, FsError::ReservedName(_)));
        assert_eq!(fs.transport().upload_count(), 0);
    }

    #[tokio::test]
    async fn invalid_names_are_rejected() {
        let fs = fs();
        for name in ["", "/abs", "a//b", "a/../b"] {
            let err = fs.put(&ctx(), name, b"x").await.unwrap_err();
            assert!(matches!(err, FsError::InvalidName { .. }), "{name:?}: {err}");
        }
        assert_eq!(fs.transport().upload_count(), 0);
    }

    #[tokio::test]
    async fn duplicate_put_keeps_one_record() {
        let fs = fs();
        fs.put(&ctx(), "a", b"v1").await.unwrap();
        fs.put(&ctx(), "b", b"x").await.unwrap();
        let second = fs.put(&ctx(), "a", b"v2").await.unwrap();

        assert_eq!(names(&fs.list(&ctx(), "").await.unwrap()), vec!["a", "b"]);
        assert_eq!(fs.transport().messages_named("a").len(), 2);
        let bytes = fs
            .transport()
            .download_blob(&ctx(), second.blob.as_ref().unwrap())
            .await
            .unwrap();
        assert_eq!(bytes, b"v2");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_puts_are_all_listed_once() {
        let channel = Arc::new(InMemoryChannel::new().with_latency(Duration::from_millis(1)));
        let config = CatalogConfig {
            max_conflict_retries: 64,
            conflict_backoff: Duration::from_millis(2),
            ..CatalogConfig::default()
        };
        let fs = Arc::new(TeleFs::new(channel, config));

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let fs = fs.clone();
                tokio::spawn(async move {
                    let name = format!("file-{i}");
                    fs.put(&OpContext::new(), &name, name.as_bytes()).await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let listed = fs.list(&ctx(), "").await.unwrap();
        let mut got = names(&listed);
        got.sort_unstable();
        let mut want: Vec<String> = (0..8).map(|i| format!("file-{i}")).collect();
        want.sort_unstable();
        assert_eq!(got, want);
    }

    #[tokio::test]
    async fn strict_window_surfaces_exhaustion() {
        let config = CatalogConfig {
            lookback_window: 2,
            strict_window: true,
            ..CatalogConfig::default()
        };
        let fs = TeleFs::new(Arc::new(InMemoryChannel::new()), config);
        for (name, data) in [("w", b"0"), ("x", b"1"), ("y", b"2")] {
            fs.transport().upload_blob(&ctx(), name, data).await.unwrap();
        }

        let err = fs.list(&ctx(), "").await.unwrap_err();
        assert!(matches!(
            err,
            FsError::Catalog(CatalogError::WindowExhausted { window: 2 })
        ));
    }

    #[tokio::test]
    async fn put_over_exhausted_window_keeps_older_entries() {
        let config = CatalogConfig {
            lookback_window: 4,
            ..CatalogConfig::default()
        };
        let fs = TeleFs::new(Arc::new(InMemoryChannel::new()), config);
        fs.put(&ctx(), "a", b"1").await.unwrap();
        fs.put(&ctx(), "b", b"2").await.unwrap();
        for i in 0..4 {
            fs.transport()
                .upload_blob(&ctx(), &format!("stray-{i}"), b"x")
                .await
                .unwrap();
        }

        let err = fs.put(&ctx(), "c", b"3").await.unwrap_err();
        assert!(matches!(
            err,
            FsError::Catalog(CatalogError::WindowExhausted { window: 4 })
        ));

        // No snapshot hiding "a" and "b" was published.
        let snapshots = fs.transport().messages_named(CATALOG_NAME);
        assert_eq!(snapshots.len(), 2);
        let newest = fs
            .transport()
            .download_blob(&ctx(), &snapshots[1].blob)
            .await
            .unwrap();
        assert_eq!(newest, br#"["a","b"]"#);

        // Reads stay lenient and flag the window instead.
        let loaded = fs.catalog(&ctx()).await.unwrap();
        assert!(loaded.catalog.is_empty());
        assert!(loaded.window_exhausted);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_aborts_blocked_put() {
        let channel = Arc::new(InMemoryChannel::new().with_latency(Duration::from_secs(3600)));
        let fs = TeleFs::new(channel, CatalogConfig::default());
        let ctx = OpContext::new();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let err = fs.put(&ctx, "a", b"1").await.unwrap_err();
        assert!(matches!(err, FsError::Transport(TransportError::Cancelled)));
        assert_eq!(fs.transport().upload_count(), 0);
    }

    #[tokio::test]
    async fn object_handles_refuse_random_access() {
        let fs = fs();
        fs.put(&ctx(), "a", b"1").await.unwrap();

        let handle = fs.object(&ctx(), "a").await.unwrap();
        let err = handle.open(&ctx(), 0, None).await.unwrap_err();
        assert!(err.is_unsupported());
        assert!(handle.mod_time(&ctx()).await.unwrap_err().is_unsupported());

        let caps = fs.capabilities();
        assert!(caps.supports(Operation::Put));
        assert!(!caps.supports(Operation::Open));
        assert!(caps.hashes.is_empty());
    }

    #[tokio::test]
    async fn object_requires_listing() {
        let fs = fs();
        let err = fs.object(&ctx(), "ghost").await.unwrap_err();
        assert!(matches!(err, FsError::NotListed(name) if name == "ghost"));
    }

    #[tokio::test]
    async fn capability_traits_dispatch_dynamically() {
        let fs = fs();
        let putter: &dyn Putter = &fs;
        let lister: &dyn Lister = &fs;
        putter.put(&ctx(), "a", b"1").await.unwrap();
        assert_eq!(names(&lister.list(&ctx(), "").await.unwrap()), vec!["a"]);
    }

    #[tokio::test]
    async fn pretty_printed_snapshot_is_readable() {
        let fs = fs();
        fs.transport()
            .upload_blob(&ctx(), CATALOG_NAME, b"[\n  \"old.txt\"\n]")
            .await
            .unwrap();
        fs.put(&ctx(), "new.txt", b"x").await.unwrap();

        assert_eq!(names(&fs.list(&ctx(), "").await.unwrap()), vec!["old.txt", "new.txt"]);
        // Snapshots written here are compact.
        let snapshots = fs.transport().messages_named(CATALOG_NAME);
        let newest = snapshots.last().unwrap();
        let bytes = fs.transport().download_blob(&ctx(), &newest.blob).await.unwrap();
        assert_eq!(bytes, br#"["old.txt","new.txt"]"#);
    }

    #[test]
    fn connect_requires_credentials() {
        let err = TeleFs::connect(&TelefsConfig::default()).unwrap_err();
        assert!(matches!(err, FsError::Config(_)));
    }
}
