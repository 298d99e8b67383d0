//! Per-resource decision logic: serve from cache, hit the network, or fail.
//!
//! A [`CachedDataController`] owns one cache key, one fetch function and one
//! TTL. Each call to [`CachedDataController::fetch_data`] decides between:
//!
//! 1. Offline: serve the cached copy if there is one, else fail.
//! 2. Online, not forced, cached copy still fresh: serve it, skip the network.
//! 3. Otherwise fetch. On success write through and serve the fresh data; on
//!    failure serve the cached copy with a warning, or fail if there is none.
//!
//! [`CachedDataController::watch_connectivity`] adds the reconnect trigger:
//! when the host comes back online while the controller is showing stale
//! data, it revalidates once in the background.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{de::DeserializeOwned, Serialize};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::{
    CacheEntry, CacheError, CacheStatus, CacheStore, CacheWarning, FetchError, WriteOutcome,
    WriteTicket,
};
use crate::connectivity::ConnectivityMonitor;

type BoxFetcher<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, FetchError>> + Send + Sync>;

/// Which cached entries may stand in for data the network could not provide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Any prior entry, however old.
    #[default]
    AnyAge,
    /// Only entries younger than the given age.
    MaxAge(Duration),
}

impl FallbackPolicy {
    pub fn admits(&self, status: &CacheStatus) -> bool {
        match self {
            FallbackPolicy::AnyAge => true,
            FallbackPolicy::MaxAge(max_age) => status.age <= *max_age,
        }
    }
}

/// Where the data in a [`FetchOutcome`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    /// Fetched from the network just now
    Network,
    /// Cached copy still within its TTL; network skipped
    CacheFresh,
    /// Offline; cached copy served without trying the network
    Offline,
    /// Network fetch failed; cached copy served instead
    Fallback,
}

#[derive(Debug, Clone)]
pub struct FetchOutcome<T> {
    pub data: T,
    pub status: CacheStatus,
    pub source: DataSource,
    pub warning: Option<CacheWarning>,
}

/// Read-only view of a controller's current state.
#[derive(Debug, Clone)]
pub struct ControllerSnapshot<T> {
    pub data: Option<T>,
    pub loading: bool,
    /// Display message for the last failure or warning.
    pub error: Option<String>,
    pub cache_status: Option<CacheStatus>,
}

impl<T> Default for ControllerSnapshot<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
            cache_status: None,
        }
    }
}

pub struct CachedDataController<T> {
    key: String,
    ttl: Duration,
    fetcher: BoxFetcher<T>,
    store: Arc<CacheStore>,
    connectivity: ConnectivityMonitor,
    policy: FallbackPolicy,
    state: Mutex<ControllerSnapshot<T>>,
    cancel: CancellationToken,
}

impl<T> CachedDataController<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub fn new<F, Fut, E>(
        key: impl Into<String>,
        fetcher: F,
        ttl: Duration,
        store: Arc<CacheStore>,
        connectivity: ConnectivityMonitor,
    ) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<FetchError> + 'static,
    {
        let fetcher: BoxFetcher<T> = Arc::new(move || {
            let fut = fetcher();
            async move { fut.await.map_err(Into::<FetchError>::into) }.boxed()
        });

        Self {
            key: key.into(),
            ttl,
            fetcher,
            store,
            connectivity,
            policy: FallbackPolicy::default(),
            state: Mutex::new(ControllerSnapshot::default()),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_fallback_policy(mut self, policy: FallbackPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock_state(&self) -> MutexGuard<'_, ControllerSnapshot<T>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> ControllerSnapshot<T> {
        self.lock_state().clone()
    }

    pub fn data(&self) -> Option<T> {
        self.lock_state().data.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.lock_state().loading
    }

    pub fn error(&self) -> Option<String> {
        self.lock_state().error.clone()
    }

    pub fn cache_status(&self) -> Option<CacheStatus> {
        self.lock_state().cache_status
    }

    /// Force a network fetch, e.g. from a "Refresh" action.
    pub async fn refresh(&self) -> Result<FetchOutcome<T>, CacheError> {
        self.fetch_data(true).await
    }

    pub async fn fetch_data(&self, force_refresh: bool) -> Result<FetchOutcome<T>, CacheError> {
        self.lock_state().loading = true;

        let result = self.resolve(force_refresh).await;

        if self.is_shut_down() {
            // Keep the last good data and error; only the fetch is gone.
            self.lock_state().loading = false;
            return result;
        }

        let mut state = self.lock_state();
        state.loading = false;
        match &result {
            Ok(outcome) => {
                state.data = Some(outcome.data.clone());
                state.cache_status = Some(outcome.status);
                state.error = outcome.warning.as_ref().map(|w| w.to_string());
            }
            Err(e) => {
                state.data = None;
                state.cache_status = None;
                state.error = Some(e.to_string());
            }
        }
        drop(state);

        result
    }

    async fn resolve(&self, force_refresh: bool) -> Result<FetchOutcome<T>, CacheError> {
        let cached: Option<CacheEntry<T>> = self.store.get_entry(&self.key);
        let now = self.store.now();

        if !self.connectivity.is_online() {
            return match self.admit_fallback(cached, now) {
                Some((data, status)) => {
                    debug!(key = %self.key, stale = status.is_stale, "Offline, serving cached data");
                    Ok(FetchOutcome {
                        data,
                        status,
                        source: DataSource::Offline,
                        warning: None,
                    })
                }
                None => {
                    warn!(key = %self.key, "Offline with no cached data");
                    Err(CacheError::NoCacheAvailableOffline {
                        key: self.key.clone(),
                    })
                }
            };
        }

        let cached = match cached {
            Some(entry) if !force_refresh && !entry.is_stale(now) => {
                debug!(key = %self.key, "Cache fresh, skipping network");
                let status = entry.status(now);
                return Ok(FetchOutcome {
                    data: entry.data,
                    status,
                    source: DataSource::CacheFresh,
                    warning: None,
                });
            }
            other => other,
        };

        let ticket = self.store.begin_write(&self.key);
        debug!(key = ticket.key(), generation = ticket.generation(), force = force_refresh, "Fetching from network");

        let fetched = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                return Err(CacheError::Cancelled { key: self.key.clone() });
            }
            result = (self.fetcher)() => result,
        };

        if self.cancel.is_cancelled() {
            return Err(CacheError::Cancelled {
                key: self.key.clone(),
            });
        }

        match fetched {
            Ok(data) => Ok(self.write_fresh(&ticket, data)),
            Err(source) => match self.admit_fallback(cached, self.store.now()) {
                Some((data, status)) => {
                    warn!(key = %self.key, error = %source, "Fetch failed, serving cached data");
                    Ok(FetchOutcome {
                        data,
                        status,
                        source: DataSource::Fallback,
                        warning: Some(CacheWarning::FetchFailedWithFallback {
                            message: source.to_string(),
                        }),
                    })
                }
                None => Err(CacheError::FetchFailedNoFallback {
                    key: self.key.clone(),
                    source,
                }),
            },
        }
    }

    fn admit_fallback(
        &self,
        cached: Option<CacheEntry<T>>,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Option<(T, CacheStatus)> {
        let entry = cached?;
        let status = entry.status(now);
        if self.policy.admits(&status) {
            Some((entry.data, status))
        } else {
            debug!(key = %self.key, age_secs = status.age.as_secs(), "Cached entry too old to fall back on");
            None
        }
    }

    /// Persist a successful fetch. Write problems downgrade to a warning since
    /// the caller still has good data in hand.
    fn write_fresh(&self, ticket: &WriteTicket, data: T) -> FetchOutcome<T> {
        let now = self.store.now();
        let fresh_status = CacheEntry::new((), now, self.ttl).fresh_status();

        let warning = match self.store.commit(ticket, &data, self.ttl) {
            Ok(WriteOutcome::Applied) => None,
            Ok(WriteOutcome::Superseded) => {
                // A newer fetch already landed; hand back what it stored.
                if let Some(newer) = self.store.get_entry::<T>(&self.key) {
                    let status = newer.status(now);
                    return FetchOutcome {
                        data: newer.data,
                        status,
                        source: DataSource::Network,
                        warning: None,
                    };
                }
                None
            }
            Err(CacheError::QuotaExceeded { key }) => {
                warn!(key = %key, "Fresh data not cached: storage full");
                Some(CacheWarning::QuotaExceeded { key })
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Fresh data not cached");
                Some(CacheWarning::WriteFailed {
                    message: e.to_string(),
                })
            }
        };

        FetchOutcome {
            data,
            status: fresh_status,
            source: DataSource::Network,
            warning,
        }
    }

    fn holds_stale_data(&self) -> bool {
        let holds_data = self.lock_state().data.is_some();
        holds_data && self.store.is_stale(&self.key)
    }

    /// Revalidate in the background each time connectivity comes back while
    /// this controller is showing stale data.
    ///
    /// The task holds only a weak reference and stops when the controller is
    /// dropped or shut down.
    pub fn watch_connectivity(self: &Arc<Self>) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);
        let mut rx = self.connectivity.subscribe();
        let cancel = self.cancel.clone();
        let key = self.key.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }

                let online = *rx.borrow_and_update();
                if !online {
                    continue;
                }
                let Some(controller) = weak.upgrade() else {
                    break;
                };
                if controller.holds_stale_data() {
                    info!(key = %key, "Back online with stale data, revalidating");
                    if let Err(e) = controller.fetch_data(false).await {
                        warn!(key = %key, error = %e, "Revalidation after reconnect failed");
                    }
                }
            }
            debug!(key = %key, "Stopped watching connectivity");
        })
    }
}

impl<T> CachedDataController<T> {
    /// Stop background work and discard any fetch still in flight.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl<T> Drop for CachedDataController<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{ManualClock, MemoryStorage};
    use chrono::TimeZone;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::{mpsc, oneshot};

    const FIVE_MINUTES: Duration = Duration::from_millis(300_000);

    fn create_store() -> (Arc<CacheStore>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            chrono::Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
        ));
        let store = CacheStore::new(Arc::new(MemoryStorage::new())).with_clock(clock.clone());
        (Arc::new(store), clock)
    }

    /// Controller whose fetcher returns `response` and counts its calls.
    fn counting_controller(
        store: &Arc<CacheStore>,
        monitor: &ConnectivityMonitor,
        response: Result<Vec<i64>, &'static str>,
    ) -> (CachedDataController<Vec<i64>>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let controller = CachedDataController::new(
            "orders_list",
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                let response = response.clone();
                async move { response }
            },
            FIVE_MINUTES,
            store.clone(),
            monitor.clone(),
        );
        (controller, calls)
    }

    #[tokio::test]
    async fn test_offline_serves_cache_without_network() {
        let (store, clock) = create_store();
        store.set("orders_list", &vec![1, 2], FIVE_MINUTES).unwrap();
        clock.advance(chrono::Duration::hours(1));
        let monitor = ConnectivityMonitor::new(false);
        let (controller, calls) = counting_controller(&store, &monitor, Ok(vec![9]));

        let outcome = controller.fetch_data(false).await.unwrap();
        assert_eq!(outcome.data, vec![1, 2]);
        assert_eq!(outcome.source, DataSource::Offline);
        assert!(outcome.status.is_stale);
        assert!(outcome.warning.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_offline_without_cache_fails() {
        let (store, _) = create_store();
        let monitor = ConnectivityMonitor::new(false);
        let (controller, calls) = counting_controller(&store, &monitor, Ok(vec![9]));

        let err = controller.fetch_data(false).await.unwrap_err();
        assert!(matches!(err, CacheError::NoCacheAvailableOffline { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let snapshot = controller.snapshot();
        assert!(snapshot.data.is_none());
        assert!(!snapshot.loading);
        assert!(snapshot.error.unwrap().contains("offline"));
    }

    #[tokio::test]
    async fn test_fresh_cache_short_circuits() {
        let (store, _) = create_store();
        store.set("orders_list", &vec![1], FIVE_MINUTES).unwrap();
        let monitor = ConnectivityMonitor::new(true);
        let (controller, calls) = counting_controller(&store, &monitor, Ok(vec![9]));

        let outcome = controller.fetch_data(false).await.unwrap();
        assert_eq!(outcome.data, vec![1]);
        assert_eq!(outcome.source, DataSource::CacheFresh);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stale_cache_fetches_and_writes_through() {
        let (store, clock) = create_store();
        store.set("orders_list", &vec![1], FIVE_MINUTES).unwrap();
        clock.advance(chrono::Duration::minutes(6));
        let monitor = ConnectivityMonitor::new(true);
        let (controller, calls) = counting_controller(&store, &monitor, Ok(vec![7, 8]));

        let outcome = controller.fetch_data(false).await.unwrap();
        assert_eq!(outcome.data, vec![7, 8]);
        assert_eq!(outcome.source, DataSource::Network);
        assert!(!outcome.status.is_stale);
        assert_eq!(outcome.status.age, Duration::ZERO);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert_eq!(store.get::<Vec<i64>>("orders_list"), Some(vec![7, 8]));
        assert!(!store.is_stale("orders_list"));
        assert_eq!(controller.data(), Some(vec![7, 8]));
    }

    #[tokio::test]
    async fn test_refresh_bypasses_fresh_cache() {
        let (store, _) = create_store();
        store.set("orders_list", &vec![1], FIVE_MINUTES).unwrap();
        let monitor = ConnectivityMonitor::new(true);
        let (controller, calls) = counting_controller(&store, &monitor, Ok(vec![2]));

        let outcome = controller.refresh().await.unwrap();
        assert_eq!(outcome.data, vec![2]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_falls_back_to_cache() {
        let (store, clock) = create_store();
        store.set("orders_list", &vec![1], FIVE_MINUTES).unwrap();
        clock.advance(chrono::Duration::minutes(30));
        let monitor = ConnectivityMonitor::new(true);
        let (controller, _) = counting_controller(&store, &monitor, Err("502 bad gateway"));

        let outcome = controller.fetch_data(false).await.unwrap();
        assert_eq!(outcome.data, vec![1]);
        assert_eq!(outcome.source, DataSource::Fallback);
        assert!(outcome.status.is_stale);
        assert_eq!(
            outcome.warning,
            Some(CacheWarning::FetchFailedWithFallback {
                message: "502 bad gateway".to_string()
            })
        );

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.data, Some(vec![1]));
        assert!(snapshot.error.unwrap().starts_with("Serving cached data"));
    }

    #[tokio::test]
    async fn test_fetch_failure_without_cache_is_fatal() {
        let (store, _) = create_store();
        let monitor = ConnectivityMonitor::new(true);
        let (controller, _) = counting_controller(&store, &monitor, Err("connection refused"));

        let err = controller.fetch_data(false).await.unwrap_err();
        match err {
            CacheError::FetchFailedNoFallback { key, source } => {
                assert_eq!(key, "orders_list");
                assert_eq!(source.to_string(), "connection refused");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_max_age_policy_refuses_ancient_fallback() {
        let (store, clock) = create_store();
        store.set("orders_list", &vec![1], FIVE_MINUTES).unwrap();
        clock.advance(chrono::Duration::days(3));
        let monitor = ConnectivityMonitor::new(true);
        let (controller, _) = counting_controller(&store, &monitor, Err("timeout"));
        let controller =
            controller.with_fallback_policy(FallbackPolicy::MaxAge(Duration::from_secs(86_400)));

        let err = controller.fetch_data(false).await.unwrap_err();
        assert!(matches!(err, CacheError::FetchFailedNoFallback { .. }));

        monitor.set_online(false);
        let err = controller.fetch_data(false).await.unwrap_err();
        assert!(matches!(err, CacheError::NoCacheAvailableOffline { .. }));
    }

    #[tokio::test]
    async fn test_quota_failure_still_returns_fresh_data() {
        let clock = Arc::new(ManualClock::starting_now());
        let store = Arc::new(
            CacheStore::new(Arc::new(MemoryStorage::with_capacity_bytes(8))).with_clock(clock),
        );
        let monitor = ConnectivityMonitor::new(true);
        let (controller, _) = counting_controller(&store, &monitor, Ok(vec![1, 2, 3]));

        let outcome = controller.fetch_data(false).await.unwrap();
        assert_eq!(outcome.data, vec![1, 2, 3]);
        assert_eq!(outcome.source, DataSource::Network);
        assert_eq!(
            outcome.warning,
            Some(CacheWarning::QuotaExceeded {
                key: "orders_list".to_string()
            })
        );
        assert!(store.get::<Vec<i64>>("orders_list").is_none());
    }

    #[tokio::test]
    async fn test_reconnect_triggers_exactly_one_refresh() {
        let (store, clock) = create_store();
        store.set("orders_list", &vec![1], FIVE_MINUTES).unwrap();
        clock.advance(chrono::Duration::hours(2));
        let monitor = ConnectivityMonitor::new(false);

        let (done_tx, mut done_rx) = mpsc::unbounded_channel();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let controller = Arc::new(CachedDataController::new(
            "orders_list",
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                let done_tx = done_tx.clone();
                async move {
                    let _ = done_tx.send(());
                    Ok::<_, &'static str>(vec![2])
                }
            },
            FIVE_MINUTES,
            store.clone(),
            monitor.clone(),
        ));
        let watcher = controller.watch_connectivity();

        controller.fetch_data(false).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        monitor.set_online(true);
        tokio::time::timeout(Duration::from_secs(2), done_rx.recv())
            .await
            .expect("revalidation should run")
            .unwrap();

        // Let the revalidation finish writing
        for _ in 0..50 {
            if controller.data() == Some(vec![2]) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(controller.data(), Some(vec![2]));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // A repeated "online" report is not a transition
        monitor.set_online(true);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        controller.shutdown();
        tokio::time::timeout(Duration::from_secs(1), watcher)
            .await
            .expect("watcher should stop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_reconnect_with_fresh_data_does_nothing() {
        let (store, _) = create_store();
        store.set("orders_list", &vec![1], FIVE_MINUTES).unwrap();
        let monitor = ConnectivityMonitor::new(false);
        let (controller, calls) = counting_controller(&store, &monitor, Ok(vec![2]));
        let controller = Arc::new(controller);
        let _watcher = controller.watch_connectivity();

        controller.fetch_data(false).await.unwrap();
        monitor.set_online(true);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    type Pending = oneshot::Receiver<Result<String, String>>;

    /// Controller whose fetches resolve only when the test says so.
    fn gated_controller(
        store: &Arc<CacheStore>,
    ) -> (
        Arc<CachedDataController<String>>,
        Arc<Mutex<VecDeque<Pending>>>,
        mpsc::UnboundedReceiver<()>,
    ) {
        let queue: Arc<Mutex<VecDeque<Pending>>> = Arc::new(Mutex::new(VecDeque::new()));
        let (started_tx, started_rx) = mpsc::unbounded_channel();
        let fetch_queue = queue.clone();
        let controller = CachedDataController::new(
            "orders_list",
            move || {
                let pending = fetch_queue.lock().unwrap().pop_front();
                let started_tx = started_tx.clone();
                async move {
                    let _ = started_tx.send(());
                    match pending {
                        Some(rx) => match rx.await {
                            Ok(result) => result,
                            Err(_) => Err("gate dropped".to_string()),
                        },
                        None => Err("no response queued".to_string()),
                    }
                }
            },
            FIVE_MINUTES,
            store.clone(),
            ConnectivityMonitor::new(true),
        );
        (Arc::new(controller), queue, started_rx)
    }

    #[tokio::test]
    async fn test_slow_older_response_does_not_overwrite_newer() {
        let (store, _) = create_store();
        let (controller, queue, mut started) = gated_controller(&store);
        let (first_tx, first_rx) = oneshot::channel();
        let (second_tx, second_rx) = oneshot::channel();
        queue.lock().unwrap().extend([first_rx, second_rx]);

        let c = controller.clone();
        let first = tokio::spawn(async move { c.refresh().await });
        started.recv().await.unwrap();
        let c = controller.clone();
        let second = tokio::spawn(async move { c.refresh().await });
        started.recv().await.unwrap();

        second_tx.send(Ok("newer".to_string())).unwrap();
        let outcome = second.await.unwrap().unwrap();
        assert_eq!(outcome.data, "newer");

        first_tx.send(Ok("older".to_string())).unwrap();
        let outcome = first.await.unwrap().unwrap();
        assert_eq!(outcome.data, "newer");
        assert_eq!(store.get::<String>("orders_list").as_deref(), Some("newer"));
    }

    #[tokio::test]
    async fn test_shutdown_discards_in_flight_fetch() {
        let (store, _) = create_store();
        let (controller, queue, mut started) = gated_controller(&store);
        let (tx, rx) = oneshot::channel();
        queue.lock().unwrap().push_back(rx);

        let c = controller.clone();
        let pending = tokio::spawn(async move { c.fetch_data(false).await });
        started.recv().await.unwrap();

        assert!(controller.is_loading());
        controller.shutdown();
        assert!(controller.is_shut_down());
        let _ = tx.send(Ok("late".to_string()));

        let err = pending.await.unwrap().unwrap_err();
        assert!(matches!(err, CacheError::Cancelled { .. }));
        assert!(store.get::<String>("orders_list").is_none());
        assert!(controller.data().is_none());
        assert!(!controller.is_loading());
        assert!(controller.error().is_none());
    }
}
