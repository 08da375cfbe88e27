use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of an update record — strongly typed, no magic strings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UpdateStatus {
    /// Shipped inside the binary at build time.
    Embedded,
    /// Served by an external dev server; no local files.
    Development,
    /// Fully downloaded and ready to launch.
    Ready,
    /// Download in progress.
    Pending,
    /// Superseded, kept only for rollback.
    Unused,
    /// Download or verification failed.
    Failed,
}

impl UpdateStatus {
    /// Statuses the store is allowed to hand back from
    /// `load_launchable_updates`.
    pub fn is_launchable(self) -> bool {
        matches!(
            self,
            UpdateStatus::Embedded | UpdateStatus::Development | UpdateStatus::Ready
        )
    }
}

impl std::fmt::Display for UpdateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateStatus::Embedded => write!(f, "embedded"),
            UpdateStatus::Development => write!(f, "development"),
            UpdateStatus::Ready => write!(f, "ready"),
            UpdateStatus::Pending => write!(f, "pending"),
            UpdateStatus::Unused => write!(f, "unused"),
            UpdateStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One installable content bundle as the metadata store describes it.
///
/// Read-only inside this crate apart from the access-timestamp touch the
/// store performs on our behalf; repairs only ever rewrite [`AssetRecord`]s.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRecord {
    pub id: String,
    /// Partition key isolating updates of one application/channel.
    pub scope_key: String,
    pub status: UpdateStatus,
    /// Manifest creation time; the ordering key for no-regression selection.
    pub commit_time: DateTime<Utc>,
    /// Binary compatibility tag from the manifest.
    pub runtime_version: String,
    /// Id of the entry-point asset, once known.
    pub launch_asset_id: Option<String>,
    pub last_accessed: Option<DateTime<Utc>>,
    /// Opaque manifest metadata consumed by selection filters.
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl UpdateRecord {
    pub fn new(
        scope_key: impl Into<String>,
        runtime_version: impl Into<String>,
        status: UpdateStatus,
        commit_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            scope_key: scope_key.into(),
            status,
            commit_time,
            runtime_version: runtime_version.into(),
            launch_asset_id: None,
            last_accessed: None,
            metadata: serde_json::Map::new(),
        }
    }
}

/// One file (script, image, font) belonging to an update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: String,
    /// Stable cross-update identifier; matches an asset to its embedded
    /// counterpart.
    pub key: String,
    /// Location under the update cache directory.
    pub relative_path: Option<String>,
    /// Lowercase hex SHA-256 digest of the file contents.
    pub hash: Option<String>,
    pub is_entry_point: bool,
    /// File name inside the bundle shipped with the binary, if any.
    pub embedded_file_name: Option<String>,
    /// Remote location used for network repair.
    pub url: Option<String>,
    pub content_type: Option<String>,
}

impl AssetRecord {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            key: key.into(),
            relative_path: None,
            hash: None,
            is_entry_point: false,
            embedded_file_name: None,
            url: None,
            content_type: None,
        }
    }
}

/// Opaque key/value constraints narrowing selection, produced by an external
/// collaborator from prior update metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestFilters(pub HashMap<String, serde_json::Value>);

impl ManifestFilters {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A candidate passes when every filter key that also appears in its
    /// metadata carries an equal value. Keys the metadata does not mention
    /// never disqualify.
    pub fn matches(&self, metadata: &serde_json::Map<String, serde_json::Value>) -> bool {
        self.0.iter().all(|(key, expected)| {
            metadata.get(key).map_or(true, |actual| actual == expected)
        })
    }
}

/// Everything the app bootstrapper needs to start the selected update.
/// Assembled fresh per `launch()` call and immutable once returned.
#[derive(Debug, Clone, Serialize)]
pub struct LaunchManifest {
    pub launched_update: UpdateRecord,
    /// Absolute path of the resolved entry-point asset.
    pub entry_asset_file: Option<PathBuf>,
    /// Fixed in-binary bundle name when launching the embedded update.
    pub embedded_bundle_name: Option<String>,
    /// Asset key → local `file://` URI for every resolved secondary asset.
    pub local_asset_files: HashMap<String, String>,
    pub using_embedded_assets: bool,
}
