//! Local caching module for offline data access.
//!
//! This module provides the `CacheStore` for storing and retrieving
//! dashboard data locally. Entries are JSON documents stamped with a write
//! time and an expiry; an expired entry is *stale*, not gone, so it can still
//! be shown when the network is unavailable.
//!
//! The store sits on a [`StorageBackend`]:
//! - [`FileStorage`]: one file per key in an origin-scoped directory
//! - [`MemoryStorage`]: volatile, used in tests
//!
//! Long-expired entries are reclaimed by [`CacheStore::clear_old_cache`],
//! which also runs automatically when a write hits the storage quota.

pub mod clock;
pub mod entry;
pub mod error;
pub mod storage;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{CacheEntry, CacheStatus};
pub use error::{CacheError, CacheWarning, FetchError};
pub use storage::{FileStorage, MemoryStorage, StorageBackend, StorageError};
pub use store::{CacheStore, EntrySummary, WriteOutcome, WriteTicket};
