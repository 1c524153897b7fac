//! Catalog synchronization over an append-only channel.
//!
//! The channel has no "current pointer". The latest catalog is whichever
//! snapshot named [`CATALOG_NAME`] appears last in a bounded history scan,
//! and that snapshot's descriptor is the [`CatalogVersion`] writers compare
//! against before publishing.
//!
//! Publishing is optimistic:
//!
//! 1. re-resolve the latest version and compare it with the writer's base
//! 2. on a mismatch reload the newer catalog, re-apply the writer's
//!    [`CatalogDelta`], and try again (bounded)
//! 3. on a match upload the new snapshot
//! 4. rescan and fold in any snapshot that slipped in between the check and
//!    the upload
//!
//! Step 4 exists because the check and the upload are separate channel
//! calls, so two writers can both pass the check. Catalogs only ever grow,
//! so folding every racing snapshot into a follow-up publish never drops an
//! entry. Conflicts (step 2) and follow-ups (step 4) have separate budgets of
//! `max_conflict_retries` each.
//!
//! Writers refuse to publish over an exhausted window: a snapshot built from
//! an empty catalog would hide every entry of the older one.

use std::time::Duration;

use rand::Rng;
use telefs_transport::{ChannelTransport, OpContext, ScanResult};
use telefs_types::{CatalogVersion, CATALOG_NAME};
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, CatalogDelta};
use crate::codec::CatalogCodec;
use crate::config::CatalogConfig;
use crate::error::{CatalogError, CatalogResult};

/// The result of [`CatalogStore::load_latest`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadedCatalog {
    pub catalog: Catalog,
    /// `None` when the scanned window holds no snapshot.
    pub version: Option<CatalogVersion>,
    /// The scan filled the whole window without finding a snapshot, so an
    /// older one may exist beyond it.
    pub window_exhausted: bool,
}

/// The result of a successful [`CatalogStore::publish`].
#[derive(Clone, Debug)]
pub struct Published {
    /// Version of the snapshot this writer published last.
    pub version: CatalogVersion,
    /// Content of that snapshot.
    pub catalog: Catalog,
    /// Snapshot uploads tried, including reconciliation follow-ups.
    pub attempts: u32,
}

/// Reads and publishes catalog snapshots on a channel.
///
/// Holds no catalog state between calls: every lookup rescans the channel.
/// Writers in other processes are reconciled through the channel alone.
#[derive(Debug)]
pub struct CatalogStore<T> {
    transport: T,
    config: CatalogConfig,
}

impl<T: ChannelTransport> CatalogStore<T> {
    pub fn new(transport: T, config: CatalogConfig) -> Self {
        Self { transport, config }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Find, download and decode the most recent snapshot.
    ///
    /// A window with no snapshot yields an empty catalog and no version. A
    /// snapshot that fails to decode is [`CatalogError::Corrupt`].
    pub async fn load_latest(&self, ctx: &OpContext) -> CatalogResult<LoadedCatalog> {
        let scan = self.scan(ctx).await?;
        match self.latest_in(&scan)? {
            Some(version) => {
                let catalog = self.fetch(ctx, &version).await?;
                debug!(version = %version, entries = catalog.len(), "loaded catalog");
                Ok(LoadedCatalog {
                    catalog,
                    version: Some(version),
                    window_exhausted: false,
                })
            }
            None => Ok(LoadedCatalog {
                catalog: Catalog::new(),
                version: None,
                window_exhausted: scan.truncated,
            }),
        }
    }

    /// The version of the most recent snapshot, without downloading it.
    pub async fn resolve_version(&self, ctx: &OpContext) -> CatalogResult<Option<CatalogVersion>> {
        let scan = self.scan(ctx).await?;
        self.latest_in(&scan)
    }

    /// Publish `catalog` only if the latest snapshot is still `base`.
    ///
    /// Fails with [`CatalogError::Stale`] when another writer got there
    /// first. Single attempt, no reconciliation.
    pub async fn try_publish(
        &self,
        ctx: &OpContext,
        base: Option<&CatalogVersion>,
        catalog: &Catalog,
    ) -> CatalogResult<CatalogVersion> {
        let current = self.resolve_version(ctx).await?;
        if current.as_ref() != base {
            return Err(CatalogError::Stale {
                expected: base.cloned(),
                found: current,
            });
        }

        let bytes = CatalogCodec::encode(catalog).map_err(|e| CatalogError::Encode(e.to_string()))?;
        let descriptor = self.transport.upload_blob(ctx, CATALOG_NAME, &bytes).await?;
        Ok(CatalogVersion::from(&descriptor))
    }

    /// Publish `catalog`, derived from `base` by applying `delta`.
    ///
    /// When another writer publishes first, the newer catalog is reloaded,
    /// `delta` is re-applied to it, and the publish is retried, up to
    /// `max_conflict_retries` times before [`CatalogError::Conflict`]. After
    /// each successful upload any snapshot that raced it is folded into a
    /// follow-up publish; those follow-ups have their own budget of the same
    /// size. Giving up after one of our snapshots already landed is
    /// [`CatalogError::Unreconciled`], never `Conflict`.
    pub async fn publish(
        &self,
        ctx: &OpContext,
        base: Option<CatalogVersion>,
        catalog: Catalog,
        delta: &CatalogDelta,
    ) -> CatalogResult<Published> {
        let budget = self.config.max_conflict_retries.max(1);
        let mut base = base;
        let mut catalog = catalog;
        let mut delta = delta.clone();
        let mut published: Option<CatalogVersion> = None;
        let mut attempts = 0;
        let mut conflicts = 0;
        let mut repairs = 0;

        loop {
            attempts += 1;
            match self.try_publish(ctx, base.as_ref(), &catalog).await {
                Ok(version) => {
                    info!(version = %version, entries = catalog.len(), attempts, "published catalog");
                    let Some(merged) = self.reconcile(ctx, base.as_ref(), &version, &catalog).await? else {
                        return Ok(Published {
                            version,
                            catalog,
                            attempts,
                        });
                    };

                    if repairs == budget {
                        warn!(version = %version, repairs, "racing snapshots kept landing; giving up");
                        return Err(CatalogError::Unreconciled { version, repairs });
                    }
                    repairs += 1;

                    let recovered: Vec<String> = merged
                        .missing_from(&catalog)
                        .into_iter()
                        .map(str::to_string)
                        .collect();
                    warn!(
                        version = %version,
                        recovered = recovered.len(),
                        "snapshot raced another writer; publishing merged catalog"
                    );
                    delta.extend(recovered);
                    base = Some(version.clone());
                    published = Some(version);
                    catalog = merged;
                }
                Err(CatalogError::Stale { expected, found }) => {
                    conflicts += 1;
                    debug!(
                        expected = ?expected.as_ref().map(|v| v.message_id),
                        found = ?found.as_ref().map(|v| v.message_id),
                        conflicts,
                        "catalog moved; re-applying changes"
                    );
                    if conflicts == budget {
                        warn!(conflicts, "giving up on catalog publish");
                        return Err(match published {
                            Some(version) => CatalogError::Unreconciled { version, repairs },
                            None => CatalogError::Conflict { attempts: conflicts },
                        });
                    }

                    let latest = self.load_latest(ctx).await?;
                    self.ensure_window(&latest)?;
                    catalog = delta.apply(&latest.catalog);
                    base = latest.version;
                    ctx.sleep(self.conflict_pause(conflicts)).await?;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Add `name` to the latest catalog.
    ///
    /// Publishes even when `name` is already listed, so the caller always
    /// ends up with a snapshot newer than the one it read. Fails with
    /// [`CatalogError::WindowExhausted`] when the window held no snapshot but
    /// older history may, whatever `strict_window` says.
    pub async fn append(&self, ctx: &OpContext, name: &str) -> CatalogResult<Published> {
        let loaded = self.load_latest(ctx).await?;
        self.ensure_window(&loaded)?;
        let delta = CatalogDelta::append(name);
        let catalog = delta.apply(&loaded.catalog);
        self.publish(ctx, loaded.version, catalog, &delta).await
    }

    fn ensure_window(&self, loaded: &LoadedCatalog) -> CatalogResult<()> {
        if loaded.window_exhausted {
            return Err(CatalogError::WindowExhausted {
                window: self.config.lookback_window,
            });
        }
        Ok(())
    }

    async fn scan(&self, ctx: &OpContext) -> CatalogResult<ScanResult> {
        Ok(self
            .transport
            .scan_recent(ctx, self.config.lookback_window)
            .await?)
    }

    /// The newest snapshot in `scan`, applying the window policy when there
    /// is none.
    fn latest_in(&self, scan: &ScanResult) -> CatalogResult<Option<CatalogVersion>> {
        let newest = scan.descriptors.iter().rev().find(|d| d.name == CATALOG_NAME);
        if let Some(descriptor) = newest {
            return Ok(Some(CatalogVersion::from(descriptor)));
        }

        let window = self.config.lookback_window;
        if scan.truncated {
            if self.config.strict_window {
                return Err(CatalogError::WindowExhausted { window });
            }
            warn!(window, "no catalog in a full lookback window; listing may be stale");
        }
        Ok(None)
    }

    async fn fetch(&self, ctx: &OpContext, version: &CatalogVersion) -> CatalogResult<Catalog> {
        let bytes = self.transport.download_blob(ctx, &version.blob).await?;
        CatalogCodec::decode(&bytes).map_err(|e| CatalogError::Corrupt {
            blob: version.blob.clone(),
            reason: e.to_string(),
        })
    }

    /// Look for snapshots that landed after `base` but before `ours`.
    ///
    /// Returns the union of those snapshots and ours, in publish order, when
    /// ours is missing any of their entries. Returns `None` when ours already
    /// reflects everything published before it.
    async fn reconcile(
        &self,
        ctx: &OpContext,
        base: Option<&CatalogVersion>,
        ours: &CatalogVersion,
        our_catalog: &Catalog,
    ) -> CatalogResult<Option<Catalog>> {
        let after = base.map(|b| b.message_id);
        let scan = self.scan(ctx).await?;
        let rivals: Vec<CatalogVersion> = scan
            .descriptors
            .iter()
            .filter(|d| d.name == CATALOG_NAME)
            .filter(|d| d.message_id < ours.message_id)
            .filter(|d| after.map_or(true, |a| d.message_id > a))
            .map(CatalogVersion::from)
            .collect();

        if rivals.is_empty() {
            return Ok(None);
        }

        let mut merged = Catalog::new();
        for rival in &rivals {
            let snapshot = self.fetch(ctx, rival).await?;
            merged = merged.merged_with(&snapshot);
        }
        merged = merged.merged_with(our_catalog);

        if merged.missing_from(our_catalog).is_empty() {
            debug!(rivals = rivals.len(), "racing snapshots already covered");
            return Ok(None);
        }
        Ok(Some(merged))
    }

    fn conflict_pause(&self, conflicts: u32) -> Duration {
        let ceiling = self.config.conflict_backoff.saturating_mul(conflicts);
        let factor: f64 = rand::thread_rng().gen_range(0.0..=1.0);
        ceiling.mul_f64(factor)
    }
}
