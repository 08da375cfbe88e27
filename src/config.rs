use std::path::PathBuf;

use serde::{Deserialize, Serialize};

const DEFAULT_CONCURRENCY: usize = 8;

/// Explicit configuration handed to the [`crate::launcher::Launcher`] at
/// construction. There is no ambient/global state; everything the engine
/// touches comes in through this struct and the collaborator handles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LauncherConfig {
    /// Root directory of the update cache; all asset relative paths resolve
    /// against it.
    pub cache_dir: PathBuf,
    /// Partition key of the running application/channel.
    pub scope_key: String,
    /// Maximum number of secondary assets resolved in parallel.
    pub concurrency: usize,
}

impl LauncherConfig {
    pub fn new(cache_dir: impl Into<PathBuf>, scope_key: impl Into<String>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            scope_key: scope_key.into(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }
}
