use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{LaunchError, LaunchResult};
use crate::model::{AssetRecord, ManifestFilters, UpdateRecord};

use super::MetadataStore;

#[derive(Default)]
struct Inner {
    updates: HashMap<String, UpdateRecord>,
    /// Asset rows per update id, entry point included.
    assets: HashMap<String, Vec<AssetRecord>>,
    filters: HashMap<String, ManifestFilters>,
}

/// In-process [`MetadataStore`] backed by maps behind an async lock.
///
/// Serves tests, examples, and the embedded-bundle bootstrap path on fresh
/// installs. Durable stores live outside this crate and plug in through the
/// same trait.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the manifest filters for a scope. Filters are produced by the
    /// manifest-loading component, so this is an inherent method rather than
    /// part of the store trait.
    pub async fn set_manifest_filters(&self, scope_key: &str, filters: ManifestFilters) {
        self.inner
            .write()
            .await
            .filters
            .insert(scope_key.to_string(), filters);
    }
}

#[async_trait]
impl MetadataStore for MemoryStore {
    async fn load_launchable_updates(&self, scope_key: &str) -> LaunchResult<Vec<UpdateRecord>> {
        let inner = self.inner.read().await;
        let updates = inner
            .updates
            .values()
            .filter(|u| u.scope_key == scope_key && u.status.is_launchable())
            .cloned()
            .collect::<Vec<_>>();
        debug!("{} launchable update(s) for scope '{}'", updates.len(), scope_key);
        Ok(updates)
    }

    async fn mark_accessed(&self, update_id: &str) -> LaunchResult<()> {
        let mut inner = self.inner.write().await;
        let update = inner
            .updates
            .get_mut(update_id)
            .ok_or_else(|| LaunchError::Store(format!("unknown update: {update_id}")))?;
        update.last_accessed = Some(Utc::now());
        Ok(())
    }

    async fn load_entry_asset(&self, update_id: &str) -> LaunchResult<AssetRecord> {
        let inner = self.inner.read().await;
        let assets = inner
            .assets
            .get(update_id)
            .ok_or_else(|| LaunchError::Store(format!("no assets for update: {update_id}")))?;

        let by_reference = inner
            .updates
            .get(update_id)
            .and_then(|u| u.launch_asset_id.as_deref())
            .and_then(|id| assets.iter().find(|a| a.id == id));

        by_reference
            .or_else(|| assets.iter().find(|a| a.is_entry_point))
            .cloned()
            .ok_or_else(|| LaunchError::Store(format!("no entry asset for update: {update_id}")))
    }

    async fn load_assets(&self, update_id: &str) -> LaunchResult<Vec<AssetRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.assets.get(update_id).cloned().unwrap_or_default())
    }

    async fn update_asset(&self, asset: &AssetRecord) -> LaunchResult<()> {
        let mut inner = self.inner.write().await;
        let mut touched = false;
        for rows in inner.assets.values_mut() {
            for row in rows.iter_mut().filter(|row| row.id == asset.id) {
                *row = asset.clone();
                touched = true;
            }
        }
        if !touched {
            return Err(LaunchError::Store(format!("unknown asset: {}", asset.id)));
        }
        Ok(())
    }

    async fn load_manifest_filters(&self, scope_key: &str) -> LaunchResult<ManifestFilters> {
        let inner = self.inner.read().await;
        Ok(inner.filters.get(scope_key).cloned().unwrap_or_default())
    }

    async fn contains_update(&self, update_id: &str) -> LaunchResult<bool> {
        Ok(self.inner.read().await.updates.contains_key(update_id))
    }

    async fn insert_update(&self, update: &UpdateRecord) -> LaunchResult<()> {
        let mut inner = self.inner.write().await;
        if inner.updates.contains_key(&update.id) {
            return Err(LaunchError::Store(format!(
                "update already exists: {}",
                update.id
            )));
        }
        inner.updates.insert(update.id.clone(), update.clone());
        Ok(())
    }

    async fn insert_asset(&self, update_id: &str, asset: &AssetRecord) -> LaunchResult<()> {
        let mut inner = self.inner.write().await;
        if !inner.updates.contains_key(update_id) {
            return Err(LaunchError::Store(format!("unknown update: {update_id}")));
        }
        inner
            .assets
            .entry(update_id.to_string())
            .or_default()
            .push(asset.clone());
        Ok(())
    }
}
