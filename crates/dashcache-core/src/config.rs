//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the API base URL, an optional bearer token, and cache
//! sizing.
//!
//! Configuration is stored at `~/.config/dashcache/config.json`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cache::store::DEFAULT_GRACE_PERIOD_HOURS;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "dashcache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Cache subdirectory used when no API origin is configured
const DEFAULT_ORIGIN_DIR: &str = "default";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub api_token: Option<String>,
    /// Upper bound on bytes held by the on-disk cache; unbounded if unset.
    pub cache_capacity_bytes: Option<u64>,
    /// How long expired entries are kept before a sweep may remove them.
    pub grace_period_hours: Option<i64>,
    #[serde(default)]
    pub start_offline: bool,
    /// Explicit cache directory; replaces the origin-scoped default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_path: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Grace period for the sweep. Negative or out-of-range hours are a
    /// configuration error rather than a silent clamp.
    pub fn grace_period(&self) -> Result<chrono::Duration> {
        let hours = self.grace_period_hours.unwrap_or(DEFAULT_GRACE_PERIOD_HOURS);
        if hours < 0 {
            anyhow::bail!("grace_period_hours must not be negative (got {})", hours);
        }
        chrono::Duration::try_hours(hours)
            .ok_or_else(|| anyhow::anyhow!("grace_period_hours is out of range (got {})", hours))
    }

    /// Cache directory for the configured API origin, so data from one
    /// backend is never shown against another.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.cache_path {
            return Ok(path.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME).join(self.origin_dir_name()?))
    }

    fn origin_dir_name(&self) -> Result<String> {
        let Some(ref base) = self.api_base_url else {
            return Ok(DEFAULT_ORIGIN_DIR.to_string());
        };
        let url = Url::parse(base).with_context(|| format!("Invalid API base URL: {}", base))?;
        let host = url
            .host_str()
            .ok_or_else(|| anyhow::anyhow!("API base URL has no host: {}", base))?;

        let mut name = format!("{}_{}", url.scheme(), host);
        if let Some(port) = url.port() {
            name.push_str(&format!("_{}", port));
        }
        Ok(name)
    }
}
