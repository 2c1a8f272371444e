//! Background refresh of the rate table.
//!
//! A refresh makes a single attempt: fetch the latest snapshot, keep it in memory and
//! replace the stored rates with it. Failures are reported through [`RefreshStatus`]
//! instead of being propagated, so the caller is never blocked or crashed by them.

use chrono::Utc;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tracing::{debug, error, info, instrument, warn};

use super::cache::SnapshotCache;
use super::rates::RateProvider;
use crate::store::{RateStore, StoreError};

pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch exchange rates from the provider";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Fetching,
    Persisting,
    EmptyResult,
    FetchFailed,
    Done,
}

/// Completion signal of one refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshStatus {
    /// Rates were fetched and stored.
    Ok { updated: usize },
    /// Rates were fetched but could not be stored. Previously stored rates stay in use.
    Warning(String),
    /// No rates were obtained.
    Error(String),
}

pub struct RefreshOrchestrator {
    provider: Arc<dyn RateProvider>,
    store: Arc<dyn RateStore>,
    snapshot: SnapshotCache,
    state: Mutex<RefreshState>,
    running: tokio::sync::Mutex<()>,
}

impl RefreshOrchestrator {
    pub fn new(
        provider: Arc<dyn RateProvider>,
        store: Arc<dyn RateStore>,
        snapshot: SnapshotCache,
    ) -> Self {
        Self {
            provider,
            store,
            snapshot,
            state: Mutex::new(RefreshState::Idle),
            running: tokio::sync::Mutex::new(()),
        }
    }

    pub fn state(&self) -> RefreshState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: RefreshState) {
        debug!(?state, "Refresh state changed");
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    fn mark_failed(&self) {
        self.set_state(RefreshState::FetchFailed);
        self.set_state(RefreshState::Done);
    }

    /// Runs one refresh. Concurrent calls wait for each other.
    #[instrument(name = "RatesRefresh", skip(self))]
    pub async fn refresh(&self) -> RefreshStatus {
        let _running = self.running.lock().await;

        self.set_state(RefreshState::Fetching);
        let snapshot = self.provider.fetch_latest().await;

        if snapshot.is_empty() {
            self.set_state(RefreshState::EmptyResult);
            warn!("No exchange rates received, keeping stored rates");
            self.set_state(RefreshState::Done);
            return RefreshStatus::Error(FETCH_FAILED_MESSAGE.to_string());
        }

        self.set_state(RefreshState::Persisting);
        let records = snapshot.to_records(Utc::now());
        self.snapshot.replace(snapshot);

        let store = Arc::clone(&self.store);
        let persisted = tokio::task::spawn_blocking(move || -> Result<usize, StoreError> {
            store.ensure_schema()?;
            store.replace_all(&records)?;
            Ok(records.len())
        })
        .await;

        let status = match persisted {
            Ok(Ok(updated)) => {
                info!(updated, "Exchange rates updated");
                RefreshStatus::Ok { updated }
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Failed to store exchange rates");
                RefreshStatus::Warning(format!("Error while updating database: {e}"))
            }
            Err(e) => {
                error!(error = %e, "Rate persistence task failed");
                RefreshStatus::Warning(format!("Error while updating database: {e}"))
            }
        };
        self.set_state(RefreshState::Done);
        status
    }
}

/// Observes a refresh running in the background.
///
/// Await the handle (or call [`RefreshHandle::wait`]) for the status, or poll it with
/// [`RefreshHandle::try_status`].
pub struct RefreshHandle {
    receiver: oneshot::Receiver<RefreshStatus>,
}

fn task_lost() -> RefreshStatus {
    RefreshStatus::Error("Rate refresh task ended without a result".to_string())
}

impl RefreshHandle {
    pub async fn wait(self) -> RefreshStatus {
        self.await
    }

    /// Returns the status once the refresh has finished, without blocking.
    pub fn try_status(&mut self) -> Option<RefreshStatus> {
        match self.receiver.try_recv() {
            Ok(status) => Some(status),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(task_lost()),
        }
    }
}

impl Future for RefreshHandle {
    type Output = RefreshStatus;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or_else(|_| task_lost()))
    }
}

/// Starts a refresh on the tokio runtime and returns immediately.
pub fn spawn_refresh(orchestrator: Arc<RefreshOrchestrator>) -> RefreshHandle {
    spawn_refresh_with(orchestrator, |_| {})
}

/// Like [`spawn_refresh`], calling `on_complete` once the refresh has finished.
pub fn spawn_refresh_with<F>(orchestrator: Arc<RefreshOrchestrator>, on_complete: F) -> RefreshHandle
where
    F: FnOnce(&RefreshStatus) + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    let worker = Arc::clone(&orchestrator);

    tokio::spawn(async move {
        let status = match tokio::spawn(async move { worker.refresh().await }).await {
            Ok(status) => status,
            Err(e) => {
                error!(error = %e, "Rate refresh task failed");
                orchestrator.mark_failed();
                RefreshStatus::Error(format!("Rate refresh task failed: {e}"))
            }
        };
        on_complete(&status);
        let _ = tx.send(status);
    });

    RefreshHandle { receiver: rx }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rates::RateSnapshot;
    use crate::core::rates::fixtures::sample_snapshot;
    use crate::store::MemoryRateStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    struct MockProvider {
        snapshot: RateSnapshot,
        call_count: AtomicUsize,
    }

    impl MockProvider {
        fn new(snapshot: RateSnapshot) -> Self {
            Self {
                snapshot,
                call_count: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RateProvider for MockProvider {
        async fn fetch_latest(&self) -> RateSnapshot {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            self.snapshot.clone()
        }
    }

    struct GatedProvider {
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl RateProvider for GatedProvider {
        async fn fetch_latest(&self) -> RateSnapshot {
            self.gate.notified().await;
            sample_snapshot()
        }
    }

    struct PanickingProvider;

    #[async_trait]
    impl RateProvider for PanickingProvider {
        async fn fetch_latest(&self) -> RateSnapshot {
            panic!("provider exploded");
        }
    }

    fn orchestrator(
        provider: Arc<dyn RateProvider>,
    ) -> (Arc<RefreshOrchestrator>, Arc<MemoryRateStore>, SnapshotCache) {
        let store = Arc::new(MemoryRateStore::new());
        let cache = SnapshotCache::new();
        let orchestrator = Arc::new(RefreshOrchestrator::new(
            provider,
            store.clone(),
            cache.clone(),
        ));
        (orchestrator, store, cache)
    }

    #[tokio::test]
    async fn test_refresh_persists_snapshot() {
        let provider = Arc::new(MockProvider::new(sample_snapshot()));
        let (orchestrator, store, cache) = orchestrator(provider.clone());
        assert_eq!(orchestrator.state(), RefreshState::Idle);

        let status = orchestrator.refresh().await;

        assert_eq!(status, RefreshStatus::Ok { updated: 12 });
        assert_eq!(orchestrator.state(), RefreshState::Done);
        assert_eq!(provider.call_count.load(Ordering::SeqCst), 1);
        assert_eq!(store.count().unwrap(), 12);
        assert_eq!(store.find_by_code("PLN").unwrap().unwrap().exchange_rate, 4.01);
        assert_eq!(cache.rate("PLN"), Some(4.01));
    }

    #[tokio::test]
    async fn test_empty_snapshot_leaves_store_untouched() {
        let (orchestrator, store, cache) =
            orchestrator(Arc::new(MockProvider::new(RateSnapshot::empty())));
        let previous = sample_snapshot().to_records(Utc::now());
        store.replace_all(&previous).unwrap();
        let before = store.all().unwrap();

        let status = orchestrator.refresh().await;

        assert_eq!(status, RefreshStatus::Error(FETCH_FAILED_MESSAGE.to_string()));
        assert_eq!(orchestrator.state(), RefreshState::Done);
        assert_eq!(store.all().unwrap(), before);
        assert!(cache.get().is_none());
    }

    #[tokio::test]
    async fn test_store_failure_is_reported_as_warning() {
        let (orchestrator, store, cache) =
            orchestrator(Arc::new(MockProvider::new(sample_snapshot())));
        store.set_failing(true);

        let status = orchestrator.refresh().await;

        match status {
            RefreshStatus::Warning(message) => {
                assert!(message.starts_with("Error while updating database"))
            }
            other => panic!("Expected a warning, got {other:?}"),
        }
        // The fresh snapshot is still available in memory
        assert_eq!(cache.rate("EUR"), Some(0.92));
        assert_eq!(orchestrator.state(), RefreshState::Done);
    }

    #[tokio::test]
    async fn test_spawned_refresh_reports_through_handle_and_callback() {
        let (orchestrator, store, _cache) =
            orchestrator(Arc::new(MockProvider::new(sample_snapshot())));
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);

        let handle = spawn_refresh_with(orchestrator, move |status| {
            assert_eq!(*status, RefreshStatus::Ok { updated: 12 });
            seen.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(handle.wait().await, RefreshStatus::Ok { updated: 12 });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(store.any().unwrap());
    }

    #[tokio::test]
    async fn test_handle_does_not_block_while_fetching() {
        let gate = Arc::new(Notify::new());
        let (orchestrator, _store, _cache) = orchestrator(Arc::new(GatedProvider {
            gate: Arc::clone(&gate),
        }));

        let mut handle = spawn_refresh(Arc::clone(&orchestrator));
        tokio::task::yield_now().await;
        assert_eq!(handle.try_status(), None);

        gate.notify_one();
        let status = (&mut handle).await;
        assert_eq!(status, RefreshStatus::Ok { updated: 12 });
        assert_eq!(orchestrator.state(), RefreshState::Done);
    }

    #[tokio::test]
    async fn test_failed_task_is_reported_as_error() {
        let (orchestrator, store, _cache) = orchestrator(Arc::new(PanickingProvider));

        let status = spawn_refresh(Arc::clone(&orchestrator)).wait().await;

        match status {
            RefreshStatus::Error(message) => {
                assert!(message.starts_with("Rate refresh task failed"))
            }
            other => panic!("Expected an error, got {other:?}"),
        }
        assert_eq!(orchestrator.state(), RefreshState::Done);
        assert!(!store.any().unwrap());
    }

    #[tokio::test]
    async fn test_each_trigger_fetches_once() {
        let provider = Arc::new(MockProvider::new(sample_snapshot()));
        let (orchestrator, store, _cache) = orchestrator(provider.clone());

        let first = spawn_refresh(Arc::clone(&orchestrator));
        let second = spawn_refresh(Arc::clone(&orchestrator));
        first.wait().await;
        second.wait().await;

        assert_eq!(provider.call_count.load(Ordering::SeqCst), 2);
        assert_eq!(store.count().unwrap(), 12);
    }
}
