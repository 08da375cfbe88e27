// ─── Embedded Bundle ───
// The update and assets shipped inside the binary at build time. Used as the
// initial runnable state on fresh installs and as a repair source when a
// cached asset goes missing.

mod dir_provider;

pub use dir_provider::DirBundleProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LaunchResult;
use crate::model::{AssetRecord, UpdateRecord};

/// The update record and asset list baked into this exact binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddedBundle {
    pub update: UpdateRecord,
    pub assets: Vec<AssetRecord>,
}

impl EmbeddedBundle {
    /// Embedded counterpart of a cached asset, matched by stable key.
    pub fn asset_by_key(&self, key: &str) -> Option<&AssetRecord> {
        self.assets.iter().find(|a| a.key == key)
    }
}

#[async_trait]
pub trait EmbeddedBundleProvider: Send + Sync {
    /// The bundle shipped with this binary.
    fn bundle(&self) -> &EmbeddedBundle;

    /// Raw bytes of one embedded asset.
    async fn read_asset(&self, asset: &AssetRecord) -> LaunchResult<Vec<u8>>;

    /// A directly loadable URI for an embedded asset, if it has one.
    fn asset_uri(&self, asset: &AssetRecord) -> Option<String>;
}
