use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the update engine.
/// Every module returns `Result<T, LaunchError>`.
#[derive(Debug, Error)]
pub enum LaunchError {
    // ── Selection ───────────────────────────────────────
    #[error("no launchable update found for this scope")]
    NoLaunchableUpdate,

    #[error("metadata store integrity violation: {0}")]
    DataIntegrity(String),

    #[error("entry-point asset could not be produced by disk, embedded bundle, or network")]
    LaunchAssetUnavailable,

    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    // ── Integrity ───────────────────────────────────────
    #[error("SHA-256 mismatch for {path:?}: expected {expected}, got {actual}")]
    HashMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Store ───────────────────────────────────────────
    #[error("metadata store error: {0}")]
    Store(String),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type LaunchResult<T> = Result<T, LaunchError>;

impl From<std::io::Error> for LaunchError {
    fn from(source: std::io::Error) -> Self {
        LaunchError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}
