//! Application wiring: one store, one connectivity monitor, one API client,
//! and a controller per dashboard resource.

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::Stream;
use serde::{de::DeserializeOwned, Serialize};
use tokio::task::JoinHandle;
use tracing::info;

use crate::api::ApiClient;
use crate::cache::{CacheStore, FileStorage};
use crate::config::Config;
use crate::connectivity::{ConnectivityMonitor, ConnectivitySignal};
use crate::controller::CachedDataController;
use crate::models::{DashboardStats, Order, Product, StaffMember};
use crate::resources::Resource;

/// Owns the process-wide cache and hands out controllers bound to it.
///
/// Controllers come back unwatched, which suits one-shot callers. Long-lived
/// views wrap them with [`Dashboard::watched`] and feed host events through
/// [`Dashboard::attach_connectivity`] to get reconnect revalidation.
pub struct Dashboard {
    store: Arc<CacheStore>,
    connectivity: ConnectivityMonitor,
    api: ApiClient,
}

impl Dashboard {
    pub fn new(store: Arc<CacheStore>, connectivity: ConnectivityMonitor, api: ApiClient) -> Self {
        Self {
            store,
            connectivity,
            api,
        }
    }

    /// Build from configuration with an origin-scoped on-disk cache.
    pub fn from_config(config: &Config) -> Result<Self> {
        let base_url = config
            .api_base_url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("No API base URL configured"))?;

        let mut api = ApiClient::new(base_url)?;
        if let Some(ref token) = config.api_token {
            api.set_token(token.clone());
        }

        let store = Self::open_store(config)?;
        let connectivity = ConnectivityMonitor::new(!config.start_offline);

        Ok(Self::new(store, connectivity, api))
    }

    /// Open the configured on-disk store without an API client, for
    /// maintenance that never touches the network.
    pub fn open_store(config: &Config) -> Result<Arc<CacheStore>> {
        let grace_period = config.grace_period()?;
        let cache_dir = config.cache_dir()?;
        let mut storage = FileStorage::new(cache_dir.clone())
            .with_context(|| format!("Failed to open cache directory: {}", cache_dir.display()))?;
        if let Some(capacity) = config.cache_capacity_bytes {
            storage = storage.with_capacity_bytes(capacity);
        }
        info!(cache_dir = %storage.dir().display(), "Opened cache");

        let store = CacheStore::new(Arc::new(storage)).with_grace_period(grace_period);
        Ok(Arc::new(store))
    }

    pub fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    pub fn connectivity(&self) -> &ConnectivityMonitor {
        &self.connectivity
    }

    /// Drive the shared monitor from host connectivity events.
    pub fn attach_connectivity<S>(&self, signals: S) -> JoinHandle<()>
    where
        S: Stream<Item = ConnectivitySignal> + Send + 'static,
    {
        self.connectivity.attach(signals)
    }

    /// Share `controller` and have it revalidate stale data whenever the
    /// monitor reports a reconnect. The watcher stops once the last `Arc`
    /// is dropped.
    pub fn watched<T>(&self, controller: CachedDataController<T>) -> Arc<CachedDataController<T>>
    where
        T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    {
        let controller = Arc::new(controller);
        controller.watch_connectivity();
        controller
    }

    fn controller<T, F, Fut>(&self, resource: Resource, fetch: F) -> CachedDataController<T>
    where
        T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
        F: Fn(ApiClient) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let api = self.api.clone();
        CachedDataController::new(
            resource.cache_key(),
            move || fetch(api.clone()),
            resource.ttl(),
            self.store.clone(),
            self.connectivity.clone(),
        )
    }

    pub fn stats(&self) -> CachedDataController<DashboardStats> {
        self.controller(Resource::DashboardStats, |api| async move {
            api.fetch_dashboard_stats().await
        })
    }

    pub fn orders(&self) -> CachedDataController<Vec<Order>> {
        self.controller(Resource::OrdersList, |api| async move { api.fetch_orders().await })
    }

    pub fn order(&self, order_id: i64) -> CachedDataController<Order> {
        self.controller(Resource::OrderDetail(order_id), move |api| async move {
            api.fetch_order(order_id).await
        })
    }

    pub fn staff(&self) -> CachedDataController<Vec<StaffMember>> {
        self.controller(Resource::StaffList, |api| async move { api.fetch_staff().await })
    }

    pub fn products(&self) -> CachedDataController<Vec<Product>> {
        self.controller(Resource::ProductsList, |api| async move { api.fetch_products().await })
    }
}
