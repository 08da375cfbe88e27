// ─── Selection Policy ───
// Pluggable ranking/eligibility algorithm choosing one update among the
// launchable candidates. Selection is pure (no I/O), so the trait is sync.

use tracing::debug;

use crate::model::{ManifestFilters, UpdateRecord};

pub trait SelectionPolicy: Send + Sync {
    /// Pick the update to launch, or none if no candidate qualifies.
    fn select(
        &self,
        candidates: &[UpdateRecord],
        filters: &ManifestFilters,
    ) -> Option<UpdateRecord>;
}

/// Minimal reference policy: newest commit time among candidates whose
/// metadata satisfies every filter. Rollout-aware policies plug in through
/// [`SelectionPolicy`].
#[derive(Debug, Default)]
pub struct LatestCommitPolicy;

impl SelectionPolicy for LatestCommitPolicy {
    fn select(
        &self,
        candidates: &[UpdateRecord],
        filters: &ManifestFilters,
    ) -> Option<UpdateRecord> {
        let chosen = candidates
            .iter()
            .filter(|u| filters.matches(&u.metadata))
            .max_by_key(|u| u.commit_time)
            .cloned();
        if let Some(update) = &chosen {
            debug!(
                "Selected update {} (committed {})",
                update.id, update.commit_time
            );
        }
        chosen
    }
}
