//! Cache entry wire format and derived staleness status.

use std::time::Duration;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// A cached payload stamped with its write time and staleness boundary.
///
/// Persisted as `{ "data": T, "timestamp": <ms>, "expiresAt": <ms> }`.
/// Expiry only changes how an entry is classified; an expired entry stays
/// readable until it is removed or swept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T> {
    pub data: T,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expires_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    /// Build an entry written at `now` that goes stale after `ttl`.
    ///
    /// Timestamps are truncated to millisecond precision so an entry compares
    /// equal before and after a trip through storage.
    pub fn new(data: T, now: DateTime<Utc>, ttl: Duration) -> Self {
        let timestamp = now.trunc_subsecs(3);
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| timestamp.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
            .trunc_subsecs(3);
        Self {
            data,
            timestamp,
            expires_at,
        }
    }

    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// True once the entry is more than `grace` past its expiry.
    pub fn is_reclaimable(&self, now: DateTime<Utc>, grace: chrono::Duration) -> bool {
        match self.expires_at.checked_add_signed(grace) {
            Some(boundary) => now > boundary,
            None => false,
        }
    }

    pub fn status(&self, now: DateTime<Utc>) -> CacheStatus {
        CacheStatus::new(self.timestamp, self.expires_at, now)
    }

    /// Status of an entry at the instant it was written.
    pub fn fresh_status(&self) -> CacheStatus {
        CacheStatus {
            is_stale: false,
            age: Duration::ZERO,
            last_updated: self.timestamp,
            expires_at: self.expires_at,
        }
    }
}

/// Freshness of a cached entry as seen at one instant. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStatus {
    pub is_stale: bool,
    pub age: Duration,
    pub last_updated: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheStatus {
    pub fn new(timestamp: DateTime<Utc>, expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        // Clock skew can put the write in the future; report zero age then.
        let age = (now - timestamp).to_std().unwrap_or(Duration::ZERO);
        Self {
            is_stale: now > expires_at,
            age,
            last_updated: timestamp,
            expires_at,
        }
    }

    pub fn age_minutes(&self) -> u64 {
        self.age.as_secs() / 60
    }

    /// Short relative age for status lines, e.g. "just now", "5m ago", "2h ago".
    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            let remaining_mins = minutes % 60;
            if remaining_mins >= 30 {
                // Round up: 1h 30m+ becomes 2h
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            let remaining_hours = (minutes % 1440) / 60;
            if remaining_hours >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
