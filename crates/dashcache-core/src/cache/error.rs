use std::fmt;

use thiserror::Error;

use super::storage::StorageError;

/// Error type produced by fetch collaborators.
pub type FetchError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("You are offline and no cached copy of '{key}' is available")]
    NoCacheAvailableOffline { key: String },

    #[error("Failed to load '{key}' and no cached copy is available: {source}")]
    FetchFailedNoFallback {
        key: String,
        #[source]
        source: FetchError,
    },

    #[error("Storage is full: '{key}' could not be saved even after clearing old entries")]
    QuotaExceeded { key: String },

    #[error("Failed to encode cache entry '{key}': {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Request for '{key}' was cancelled")]
    Cancelled { key: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// A non-fatal problem reported next to otherwise valid data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheWarning {
    /// The network fetch failed and cached data is being served instead.
    FetchFailedWithFallback { message: String },
    /// Fresh data arrived but could not be persisted for lack of space.
    QuotaExceeded { key: String },
    /// Fresh data arrived but the store rejected the write.
    WriteFailed { message: String },
}

impl fmt::Display for CacheWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheWarning::FetchFailedWithFallback { message } => {
                write!(f, "Serving cached data; refresh failed: {}", message)
            }
            CacheWarning::QuotaExceeded { key } => {
                write!(f, "Showing live data; '{}' could not be saved (storage full)", key)
            }
            CacheWarning::WriteFailed { message } => {
                write!(f, "Showing live data; saving to cache failed: {}", message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_are_displayable() {
        let err = CacheError::NoCacheAvailableOffline {
            key: "orders_list".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "You are offline and no cached copy of 'orders_list' is available"
        );

        let err = CacheError::FetchFailedNoFallback {
            key: "staff_list".to_string(),
            source: "connection refused".into(),
        };
        assert!(err.to_string().contains("connection refused"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_warning_display() {
        let warning = CacheWarning::FetchFailedWithFallback {
            message: "timeout".to_string(),
        };
        assert_eq!(warning.to_string(), "Serving cached data; refresh failed: timeout");
    }
}
