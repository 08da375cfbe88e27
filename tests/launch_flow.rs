// End-to-end launch flows through the public API: a fresh install booting
// from the embedded bundle, then a downloaded update taking over.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

use airlift::{
    AssetFetcher, AssetRecord, DirBundleProvider, EmbeddedBundle, LatestCommitPolicy, LaunchError,
    LaunchResult, Launcher, LauncherConfig, MemoryStore, MetadataStore, UpdateRecord, UpdateStatus,
    EMBEDDED_BUNDLE_NAME,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}

struct FailingFetcher;

#[async_trait]
impl AssetFetcher for FailingFetcher {
    async fn download(&self, asset: &AssetRecord) -> LaunchResult<AssetRecord> {
        Err(LaunchError::DownloadFailed {
            url: asset.url.clone().unwrap_or_else(|| "unknown".into()),
            status: 503,
        })
    }
}

/// Write a bundle directory the way a build step would: manifest plus the
/// embedded asset files.
async fn write_bundle_dir() -> TempDir {
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
    tokio::fs::write(dir.path().join("app.bundle"), b"embedded js")
        .await
        .unwrap();
    tokio::fs::write(dir.path().join("icon.png"), b"embedded icon")
        .await
        .unwrap();

    dir
}

#[tokio::test]
async fn fresh_install_boots_from_embedded_bundle() {
    init_tracing();
    let bundle_dir = write_bundle_dir().await;
    let cache = TempDir::new().unwrap();

    let store = Arc::new(MemoryStore::new());
    let provider = Arc::new(DirBundleProvider::load(bundle_dir.path()).await.unwrap());
    let launcher = Launcher::new(
        LauncherConfig::new(cache.path(), "s1"),
        store,
        Arc::new(LatestCommitPolicy),
        Arc::new(FailingFetcher),
        Some(provider),
    );

    assert!(launcher.ensure_embedded_bundle().await.unwrap());
    let manifest = launcher.launch().await.unwrap();

    assert!(manifest.using_embedded_assets);
    assert_eq!(
        manifest.embedded_bundle_name.as_deref(),
        Some(EMBEDDED_BUNDLE_NAME)
    );
    assert!(manifest.entry_asset_file.is_none());
}

#[tokio::test]
async fn downloaded_update_supersedes_the_embedded_one() {
    init_tracing();
    let bundle_dir = write_bundle_dir().await;
    let cache = TempDir::new().unwrap();

    let store = Arc::new(MemoryStore::new());
    let provider = Arc::new(DirBundleProvider::load(bundle_dir.path()).await.unwrap());
    let launcher = Launcher::new(
        LauncherConfig::new(cache.path(), "s1"),
        store.clone(),
        Arc::new(LatestCommitPolicy),
        Arc::new(FailingFetcher),
        Some(provider),
    );
    launcher.ensure_embedded_bundle().await.unwrap();

    // A newer update, fully downloaded by the (out-of-scope) loader.
    let mut newer = UpdateRecord::new(
        "s1",
        "1.0.0",
        UpdateStatus::Ready,
        Utc::now() + Duration::seconds(60),
    );
    let mut entry = AssetRecord::new("bundle.js");
    entry.is_entry_point = true;
    entry.relative_path = Some("bundle-v2.js".into());
    newer.launch_asset_id = Some(entry.id.clone());
    let mut styles = AssetRecord::new("styles.css");
    styles.relative_path = Some("styles.css".into());

    store.insert_update(&newer).await.unwrap();
    store.insert_asset(&newer.id, &entry).await.unwrap();
    store.insert_asset(&newer.id, &styles).await.unwrap();
    tokio::fs::write(cache.path().join("bundle-v2.js"), b"js v2")
        .await
        .unwrap();
    tokio::fs::write(cache.path().join("styles.css"), b"css")
        .await
        .unwrap();

    let manifest = launcher.launch().await.unwrap();

    assert_eq!(manifest.launched_update.id, newer.id);
    assert!(!manifest.using_embedded_assets);
    assert_eq!(
        manifest.entry_asset_file.as_deref(),
        Some(cache.path().join("bundle-v2.js").as_path())
    );
    assert!(manifest.local_asset_files.contains_key("styles.css"));
    // The embedded icon stays reachable even though the newer update never
    // shipped one.
    assert!(manifest.local_asset_files.contains_key("icon.png"));
}
