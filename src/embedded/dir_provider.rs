use std::path::PathBuf;

use async_trait::async_trait;
use tracing::info;

use crate::error::{LaunchError, LaunchResult};
use crate::model::AssetRecord;

use super::{EmbeddedBundle, EmbeddedBundleProvider};

const BUNDLE_MANIFEST: &str = "bundle.json";

/// [`EmbeddedBundleProvider`] reading a `bundle.json` manifest plus asset
/// files from a directory shipped next to the binary.
#[derive(Debug)]
pub struct DirBundleProvider {
    root: PathBuf,
    bundle: EmbeddedBundle,
}

impl DirBundleProvider {
    /// Load the bundle manifest from `<root>/bundle.json`.
    pub async fn load(root: impl Into<PathBuf>) -> LaunchResult<Self> {
        let root = root.into();
        let manifest_path = root.join(BUNDLE_MANIFEST);
        let json = tokio::fs::read_to_string(&manifest_path)
            .await
            .map_err(|e| LaunchError::Io {
                path: manifest_path.clone(),
                source: e,
            })?;
        let bundle: EmbeddedBundle = serde_json::from_str(&json)?;

        info!(
            "Loaded embedded bundle {} ({} asset(s)) from {:?}",
            bundle.update.id,
            bundle.assets.len(),
            root
        );
        Ok(Self { root, bundle })
    }

    fn file_path(&self, asset: &AssetRecord) -> Option<PathBuf> {
        asset
            .embedded_file_name
            .as_deref()
            .map(|name| self.root.join(name))
    }
}

#[async_trait]
impl EmbeddedBundleProvider for DirBundleProvider {
    fn bundle(&self) -> &EmbeddedBundle {
        &self.bundle
    }

    async fn read_asset(&self, asset: &AssetRecord) -> LaunchResult<Vec<u8>> {
        let path = self.file_path(asset).ok_or_else(|| {
            LaunchError::Other(format!("asset '{}' has no embedded file", asset.key))
        })?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| LaunchError::Io { path, source: e })
    }

    fn asset_uri(&self, asset: &AssetRecord) -> Option<String> {
        self.file_path(asset)
            .map(|path| format!("file://{}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tempfile::TempDir;

    use super::*;
    use crate::model::{UpdateRecord, UpdateStatus};

    async fn write_bundle_dir() -> (TempDir, String) {
        let dir = TempDir::new().unwrap();

        let mut update = UpdateRecord::new("s1", "1.0.0", UpdateStatus::Embedded, Utc::now());
        let mut entry = AssetRecord::new("bundle.js");
        entry.is_entry_point = true;
        entry.embedded_file_name = Some("app.bundle".into());
        update.launch_asset_id = Some(entry.id.clone());

        let mut icon = AssetRecord::new("icon.png");
        icon.embedded_file_name = Some("icon.png".into());

        let bundle = EmbeddedBundle {
            update,
            assets: vec![entry, icon],
        };
        tokio::fs::write(
            dir.path().join("bundle.json"),
            serde_json::to_string_pretty(&bundle).unwrap(),
        )
        .await
        .unwrap();
        tokio::fs::write(dir.path().join("app.bundle"), b"js code")
            .await
            .unwrap();
        tokio::fs::write(dir.path().join("icon.png"), b"png bytes")
            .await
            .unwrap();

        let update_id = bundle.update.id.clone();
        (dir, update_id)
    }

    #[tokio::test]
    async fn loads_manifest_and_serves_bytes() {
        let (dir, update_id) = write_bundle_dir().await;
        let provider = DirBundleProvider::load(dir.path()).await.unwrap();

        assert_eq!(provider.bundle().update.id, update_id);
        let icon = provider.bundle().asset_by_key("icon.png").unwrap().clone();
        let bytes = provider.read_asset(&icon).await.unwrap();
        assert_eq!(bytes, b"png bytes");
    }

    #[tokio::test]
    async fn uri_points_into_bundle_dir() {
        let (dir, _) = write_bundle_dir().await;
        let provider = DirBundleProvider::load(dir.path()).await.unwrap();

        let icon = provider.bundle().asset_by_key("icon.png").unwrap().clone();
        let uri = provider.asset_uri(&icon).unwrap();
        assert!(uri.starts_with("file://"));
        assert!(uri.ends_with("icon.png"));
    }

    #[tokio::test]
    async fn missing_manifest_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let err = DirBundleProvider::load(dir.path()).await.unwrap_err();
        assert!(matches!(err, LaunchError::Io { .. }));
    }

    #[tokio::test]
    async fn asset_without_embedded_file_is_rejected() {
        let (dir, _) = write_bundle_dir().await;
        let provider = DirBundleProvider::load(dir.path()).await.unwrap();

        let detached = AssetRecord::new("remote-only.png");
        assert!(provider.read_asset(&detached).await.is_err());
    }
}
