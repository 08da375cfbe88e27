use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::digest::sha256_hex;
use crate::error::{LaunchError, LaunchResult};
use crate::http::build_http_client;
use crate::model::AssetRecord;

use super::AssetFetcher;

/// [`AssetFetcher`] over plain HTTP(S) with SHA-256 validation.
///
/// Repaired files are named by their digest (original extension kept), so a
/// re-download of changed content never collides with stale bytes already in
/// the cache.
pub struct HttpAssetFetcher {
    client: Client,
    cache_dir: PathBuf,
}

impl HttpAssetFetcher {
    pub fn new(cache_dir: impl Into<PathBuf>) -> LaunchResult<Self> {
        Ok(Self {
            client: build_http_client()?,
            cache_dir: cache_dir.into(),
        })
    }

    /// Use an externally configured client (proxies, timeouts).
    pub fn with_client(client: Client, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            cache_dir: cache_dir.into(),
        }
    }

    /// Digest-derived cache file name, keeping the extension of the original
    /// path (or the URL path) so platform loaders still recognize the type.
    fn repaired_file_name(asset: &AssetRecord, digest: &str) -> String {
        let extension = asset
            .relative_path
            .as_deref()
            .and_then(|p| Path::new(p).extension())
            .and_then(|e| e.to_str())
            .or_else(|| {
                asset
                    .url
                    .as_deref()
                    .and_then(|u| u.rsplit('/').next())
                    .and_then(|name| Path::new(name).extension())
                    .and_then(|e| e.to_str())
            });

        match extension {
            Some(ext) => format!("{digest}.{ext}"),
            None => digest.to_string(),
        }
    }
}

#[async_trait]
impl AssetFetcher for HttpAssetFetcher {
    async fn download(&self, asset: &AssetRecord) -> LaunchResult<AssetRecord> {
        let url = asset.url.as_deref().ok_or_else(|| {
            LaunchError::Other(format!("asset '{}' has no remote url", asset.key))
        })?;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LaunchError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;

        // Validate against the recorded digest before anything touches disk.
        let digest = sha256_hex(&bytes);
        let file_name = Self::repaired_file_name(asset, &digest);
        let dest = self.cache_dir.join(&file_name);
        if let Some(expected) = asset.hash.as_deref() {
            if digest != expected {
                return Err(LaunchError::HashMismatch {
                    path: dest,
                    expected: expected.to_string(),
                    actual: digest,
                });
            }
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LaunchError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        tokio::fs::write(&dest, &bytes)
            .await
            .map_err(|e| LaunchError::Io {
                path: dest.clone(),
                source: e,
            })?;

        debug!("Repaired asset '{}' from {} -> {:?}", asset.key, url, dest);

        let mut repaired = asset.clone();
        repaired.relative_path = Some(file_name);
        repaired.hash = Some(digest);
        Ok(repaired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repaired_name_keeps_path_extension() {
        let mut asset = AssetRecord::new("bundle.js");
        asset.relative_path = Some("bundles/main.js".into());
        assert_eq!(
            HttpAssetFetcher::repaired_file_name(&asset, "abc123"),
            "abc123.js"
        );
    }

    #[test]
    fn repaired_name_falls_back_to_url_extension() {
        let mut asset = AssetRecord::new("logo");
        asset.url = Some("https://cdn.example.com/assets/logo.png".into());
        assert_eq!(
            HttpAssetFetcher::repaired_file_name(&asset, "abc123"),
            "abc123.png"
        );
    }

    #[test]
    fn repaired_name_without_extension_is_bare_digest() {
        let asset = AssetRecord::new("blob");
        assert_eq!(
            HttpAssetFetcher::repaired_file_name(&asset, "abc123"),
            "abc123"
        );
    }

    #[tokio::test]
    async fn download_requires_a_url() {
        let fetcher = HttpAssetFetcher::new("/tmp/airlift-cache").unwrap();
        let asset = AssetRecord::new("no-url");
        assert!(matches!(
            fetcher.download(&asset).await,
            Err(LaunchError::Other(_))
        ));
    }
}
