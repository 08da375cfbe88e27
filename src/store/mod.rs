// ─── Metadata Store ───
// Capability seam over the persisted table of update and asset records.
// Queried read-mostly; this crate writes exactly one access timestamp per
// launch plus one asset row per successful repair.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::error::LaunchResult;
use crate::model::{AssetRecord, ManifestFilters, UpdateRecord};

#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Update records the store classifies as launchable for a scope.
    async fn load_launchable_updates(&self, scope_key: &str) -> LaunchResult<Vec<UpdateRecord>>;

    /// Touch the access timestamp of an update.
    async fn mark_accessed(&self, update_id: &str) -> LaunchResult<()>;

    /// The entry-point asset of an update.
    async fn load_entry_asset(&self, update_id: &str) -> LaunchResult<AssetRecord>;

    /// Every asset belonging to an update, entry point included.
    async fn load_assets(&self, update_id: &str) -> LaunchResult<Vec<AssetRecord>>;

    /// Write back a repaired asset row (new path and hash).
    async fn update_asset(&self, asset: &AssetRecord) -> LaunchResult<()>;

    /// Current selection constraints for a scope.
    async fn load_manifest_filters(&self, scope_key: &str) -> LaunchResult<ManifestFilters>;

    /// Whether an update row exists at all, launchable or not.
    async fn contains_update(&self, update_id: &str) -> LaunchResult<bool>;

    /// Insert a new update row. Used only by the embedded-bundle bootstrap.
    async fn insert_update(&self, update: &UpdateRecord) -> LaunchResult<()>;

    /// Insert a new asset row for an update. Used only by the
    /// embedded-bundle bootstrap.
    async fn insert_asset(&self, update_id: &str, asset: &AssetRecord) -> LaunchResult<()>;
}
