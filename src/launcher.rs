// ─── Launcher ───
// Selects the update to boot from and brings every asset it needs to a
// launchable state. Selection always happens before any disk check, so a
// disk-level repair can never cause a newer update to be skipped in favor
// of an older one.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::config::LauncherConfig;
use crate::embedded::EmbeddedBundleProvider;
use crate::error::{LaunchError, LaunchResult};
use crate::fetcher::AssetFetcher;
use crate::model::{AssetRecord, LaunchManifest, UpdateRecord, UpdateStatus};
use crate::policy::SelectionPolicy;
use crate::resolver::IntegrityResolver;
use crate::store::MetadataStore;

/// Name of the bundle file compiled into the binary, reported when the
/// embedded update itself is launched.
pub const EMBEDDED_BUNDLE_NAME: &str = "app.bundle";

pub struct Launcher {
    config: LauncherConfig,
    store: Arc<dyn MetadataStore>,
    policy: Arc<dyn SelectionPolicy>,
    embedded: Option<Arc<dyn EmbeddedBundleProvider>>,
    resolver: IntegrityResolver,
}

impl Launcher {
    pub fn new(
        config: LauncherConfig,
        store: Arc<dyn MetadataStore>,
        policy: Arc<dyn SelectionPolicy>,
        fetcher: Arc<dyn AssetFetcher>,
        embedded: Option<Arc<dyn EmbeddedBundleProvider>>,
    ) -> Self {
        let resolver = IntegrityResolver::new(
            config.cache_dir.clone(),
            store.clone(),
            fetcher,
            embedded.clone(),
        );
        Self {
            config,
            store,
            policy,
            embedded,
            resolver,
        }
    }

    /// Select the most appropriate stored update and make it launchable.
    ///
    /// Side effects: one access-timestamp write on the selected update, plus
    /// one asset row write-back per successful repair.
    pub async fn launch(&self) -> LaunchResult<LaunchManifest> {
        let update = self
            .select_launchable_update()
            .await?
            .ok_or(LaunchError::NoLaunchableUpdate)?;
        info!("Launching update {} (status: {})", update.id, update.status);

        self.store.mark_accessed(&update.id).await?;

        match update.status {
            UpdateStatus::Embedded => {
                // Assets load straight from the binary.
                return Ok(LaunchManifest {
                    launched_update: update,
                    entry_asset_file: None,
                    embedded_bundle_name: Some(EMBEDDED_BUNDLE_NAME.to_string()),
                    local_asset_files: HashMap::new(),
                    using_embedded_assets: true,
                });
            }
            UpdateStatus::Development => {
                // A dev server owns content delivery; nothing local to do.
                return Ok(LaunchManifest {
                    launched_update: update,
                    entry_asset_file: None,
                    embedded_bundle_name: None,
                    local_asset_files: HashMap::new(),
                    using_embedded_assets: true,
                });
            }
            _ => {}
        }

        // Entry point first, sequentially. A hard resolver failure here
        // aborts before any fan-out work is spent.
        let entry = self.store.load_entry_asset(&update.id).await?;
        if entry.relative_path.is_none() {
            return Err(LaunchError::DataIntegrity(format!(
                "entry asset '{}' of update {} has no relative path",
                entry.key, update.id
            )));
        }
        let entry_file = self.resolver.resolve(&entry).await?;

        let assets = self.store.load_assets(&update.id).await?;
        let mut local_asset_files = self.embedded_asset_base();

        let secondary: Vec<AssetRecord> =
            assets.into_iter().filter(|a| !a.is_entry_point).collect();
        let resolver = &self.resolver;
        let entry_id = entry.id.as_str();

        let resolved: Vec<Option<(String, String)>> = stream::iter(secondary)
            .map(|asset| async move {
                if asset.id == entry_id {
                    // Excluded from this list by construction; kept as a
                    // no-op safety net.
                    return None;
                }
                match resolver.resolve(&asset).await {
                    Ok(Some(path)) => Some((asset.key.clone(), file_uri(&path))),
                    Ok(None) => {
                        warn!("Asset '{}' left unresolved", asset.key);
                        None
                    }
                    Err(e) => {
                        warn!("Asset '{}' resolution failed: {}", asset.key, e);
                        None
                    }
                }
            })
            .buffer_unordered(self.config.concurrency)
            .collect()
            .await;

        // Merge on this task after the join; the map never sees concurrent
        // writers.
        for (key, uri) in resolved.into_iter().flatten() {
            local_asset_files.insert(key, uri);
        }

        let Some(entry_file) = entry_file else {
            return Err(LaunchError::LaunchAssetUnavailable);
        };

        info!(
            "Update {} launchable: entry at {:?}, {} local asset(s)",
            update.id,
            entry_file,
            local_asset_files.len()
        );

        Ok(LaunchManifest {
            launched_update: update,
            entry_asset_file: Some(entry_file),
            embedded_bundle_name: None,
            local_asset_files,
            using_embedded_assets: false,
        })
    }

    /// Candidates come from the store, already restricted to launchable
    /// statuses for this scope; an embedded-status row is eligible only when
    /// it is the update actually compiled into this binary.
    async fn select_launchable_update(&self) -> LaunchResult<Option<UpdateRecord>> {
        let mut candidates = self
            .store
            .load_launchable_updates(&self.config.scope_key)
            .await?;

        if let Some(provider) = &self.embedded {
            let embedded_id = provider.bundle().update.id.as_str();
            candidates.retain(|u| u.status != UpdateStatus::Embedded || u.id == embedded_id);
        }

        let filters = self
            .store
            .load_manifest_filters(&self.config.scope_key)
            .await?;
        Ok(self.policy.select(&candidates, &filters))
    }

    /// Base asset mapping seeded with the embedded bundle's own non-entry
    /// assets. If resolution of a same-keyed asset fails later, the
    /// known-good embedded URI stays available under that key.
    fn embedded_asset_base(&self) -> HashMap<String, String> {
        let mut base = HashMap::new();
        if let Some(provider) = &self.embedded {
            for asset in &provider.bundle().assets {
                if asset.is_entry_point {
                    continue;
                }
                if let Some(uri) = provider.asset_uri(asset) {
                    base.insert(asset.key.clone(), uri);
                }
            }
        }
        base
    }

    /// Seed the store with the update compiled into this binary, so a fresh
    /// install has something launchable before any download completes.
    /// Idempotent: a store that already knows the embedded update is left
    /// untouched.
    pub async fn ensure_embedded_bundle(&self) -> LaunchResult<bool> {
        let Some(provider) = &self.embedded else {
            return Ok(false);
        };
        let bundle = provider.bundle();
        if self.store.contains_update(&bundle.update.id).await? {
            return Ok(false);
        }

        self.store.insert_update(&bundle.update).await?;
        for asset in &bundle.assets {
            self.store.insert_asset(&bundle.update.id, asset).await?;
        }
        info!(
            "Bootstrapped embedded update {} ({} asset(s)) into the store",
            bundle.update.id,
            bundle.assets.len()
        );
        Ok(true)
    }
}

pub(crate) fn file_uri(path: &Path) -> String {
    format!("file://{}", path.display())
}
