// ─── Integrity Resolver ───
// Brings a single asset the store believes exists to a real file on disk:
// disk check, then embedded copy, then network repair. First success wins.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::digest::sha256_hex;
use crate::embedded::EmbeddedBundleProvider;
use crate::error::{LaunchError, LaunchResult};
use crate::fetcher::AssetFetcher;
use crate::model::AssetRecord;
use crate::store::MetadataStore;

pub struct IntegrityResolver {
    cache_dir: PathBuf,
    store: Arc<dyn MetadataStore>,
    fetcher: Arc<dyn AssetFetcher>,
    embedded: Option<Arc<dyn EmbeddedBundleProvider>>,
}

impl IntegrityResolver {
    pub fn new(
        cache_dir: PathBuf,
        store: Arc<dyn MetadataStore>,
        fetcher: Arc<dyn AssetFetcher>,
        embedded: Option<Arc<dyn EmbeddedBundleProvider>>,
    ) -> Self {
        Self {
            cache_dir,
            store,
            fetcher,
            embedded,
        }
    }

    /// Resolve one asset to a file under the cache directory.
    ///
    /// `Ok(None)` means the asset stays unresolved but the launch may
    /// proceed without it; `Err` is reserved for entry-point assets, whose
    /// absence aborts the launch.
    pub async fn resolve(&self, asset: &AssetRecord) -> LaunchResult<Option<PathBuf>> {
        // Tier 1: already on disk. No embedded or network work.
        if let Some(relative) = asset.relative_path.as_deref() {
            let path = self.cache_dir.join(relative);
            if path.exists() {
                debug!("Asset '{}' present at {:?}", asset.key, path);
                return Ok(Some(path));
            }
        }

        // Tier 2: restore from the bundle shipped with the binary.
        if let Some(path) = self.restore_from_embedded(asset).await {
            return Ok(Some(path));
        }

        // Tier 3: network repair.
        self.repair_over_network(asset).await
    }

    /// Copy the embedded counterpart (matched by key) to the expected cache
    /// path and verify its digest. Any failure disqualifies this tier for
    /// this call only; the caller falls through to the network.
    async fn restore_from_embedded(&self, asset: &AssetRecord) -> Option<PathBuf> {
        let provider = self.embedded.as_ref()?;
        let counterpart = provider.bundle().asset_by_key(&asset.key)?.clone();
        let relative = asset.relative_path.as_deref()?;
        // Without a recorded hash the copy cannot be verified; let the
        // network tier produce an authoritative record instead.
        let expected = asset.hash.as_deref()?;
        let dest = self.cache_dir.join(relative);

        match self
            .copy_and_verify(provider.as_ref(), &counterpart, &dest, expected)
            .await
        {
            Ok(()) => {
                debug!("Asset '{}' restored from embedded bundle", asset.key);
                Some(dest)
            }
            Err(e) => {
                debug!("Embedded copy of '{}' unusable: {}", asset.key, e);
                None
            }
        }
    }

    async fn copy_and_verify(
        &self,
        provider: &dyn EmbeddedBundleProvider,
        counterpart: &AssetRecord,
        dest: &Path,
        expected: &str,
    ) -> LaunchResult<()> {
        let bytes = provider.read_asset(counterpart).await?;

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LaunchError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        tokio::fs::write(dest, &bytes)
            .await
            .map_err(|e| LaunchError::Io {
                path: dest.to_path_buf(),
                source: e,
            })?;

        let actual = sha256_hex(&bytes);
        if actual != expected {
            // A later disk check must not pick up bytes that just failed
            // verification.
            let _ = tokio::fs::remove_file(dest).await;
            return Err(LaunchError::HashMismatch {
                path: dest.to_path_buf(),
                expected: expected.to_string(),
                actual,
            });
        }
        Ok(())
    }

    /// Fetch the asset, persist the (possibly changed) record, and hand back
    /// the repaired path if the fetcher actually materialized it.
    async fn repair_over_network(&self, asset: &AssetRecord) -> LaunchResult<Option<PathBuf>> {
        match self.fetcher.download(asset).await {
            Ok(repaired) => {
                self.store.update_asset(&repaired).await?;
                match repaired.relative_path.as_deref() {
                    Some(relative) => {
                        let path = self.cache_dir.join(relative);
                        if path.exists() {
                            debug!("Asset '{}' repaired to {:?}", asset.key, path);
                            Ok(Some(path))
                        } else {
                            warn!(
                                "Fetcher reported '{}' repaired but {:?} does not exist",
                                asset.key, path
                            );
                            Ok(None)
                        }
                    }
                    None => Ok(None),
                }
            }
            Err(e) if asset.is_entry_point => {
                warn!("Entry-point asset '{}' unreachable: {}", asset.key, e);
                Err(LaunchError::LaunchAssetUnavailable)
            }
            Err(e) => {
                warn!("Leaving asset '{}' unresolved: {}", asset.key, e);
                Ok(None)
            }
        }
    }
}
