use super::rates::RateSnapshot;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Holds the last good snapshot in memory, shared between the refresh and the lookup.
///
/// The snapshot is only ever replaced as a whole. Empty snapshots are never stored.
#[derive(Clone, Default)]
pub struct SnapshotCache {
    inner: Arc<RwLock<Option<RateSnapshot>>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<RateSnapshot> {
        let cache = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let value = cache.clone();
        if value.is_some() {
            debug!("Snapshot cache HIT");
        } else {
            debug!("Snapshot cache MISS");
        }
        value
    }

    /// Reads one rate from the cached snapshot without cloning it.
    pub fn rate(&self, code: &str) -> Option<f64> {
        let cache = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        cache.as_ref().and_then(|snapshot| snapshot.rate(code))
    }

    /// Replaces the cached snapshot. Returns `false` and keeps the old one if `snapshot`
    /// is empty.
    pub fn replace(&self, snapshot: RateSnapshot) -> bool {
        if snapshot.is_empty() {
            debug!("Ignoring empty snapshot");
            return false;
        }
        let mut cache = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        debug!("Snapshot cache PUT");
        *cache = Some(snapshot);
        true
    }
}
