// ─── Asset Fetcher ───
// Capability seam over network retrieval of a single missing asset. The
// resolver's last tier; everything before it is local.

mod http_fetcher;

pub use http_fetcher::HttpAssetFetcher;

use async_trait::async_trait;

use crate::error::LaunchResult;
use crate::model::AssetRecord;

#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Retrieve one asset and place it under the cache directory.
    ///
    /// Returns the updated record, possibly with a new relative path and
    /// hash when the remote content changed since the record was written.
    async fn download(&self, asset: &AssetRecord) -> LaunchResult<AssetRecord>;
}
