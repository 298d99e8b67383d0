//! dashcache core - resilient client-side data cache for the admin dashboard.
//!
//! Views ask a [`CachedDataController`] for data. The controller consults the
//! [`CacheStore`] and the [`ConnectivityMonitor`] and either serves the cached
//! copy, fetches from the network and writes through, or falls back to stale
//! data when the fetch fails. Every answer carries a [`CacheStatus`] so the
//! view can flag stale data.

pub mod api;
pub mod cache;
pub mod config;
pub mod connectivity;
pub mod controller;
pub mod dashboard;
pub mod models;
pub mod resources;
pub mod utils;

pub use cache::{CacheError, CacheStatus, CacheStore, CacheWarning};
pub use config::Config;
pub use connectivity::{ConnectivityMonitor, ConnectivitySignal};
pub use controller::{CachedDataController, DataSource, FallbackPolicy, FetchOutcome};
pub use dashboard::Dashboard;
