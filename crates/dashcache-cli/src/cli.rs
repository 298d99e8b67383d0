//! Command-line interface parsing.
//!
//! Connection settings come from the saved config file, then the environment
//! (`DASHCACHE_API_URL`, `DASHCACHE_TOKEN`, also read from `.env`), then flags.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use dashcache_core::Config;

/// dashcache - admin dashboard data that keeps working offline
#[derive(Parser, Debug)]
#[command(name = "dashcache")]
#[command(about = "Admin dashboard for orders, staff and products, served from a local cache when offline")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// Treat the network as unavailable and answer from the cache only
    #[arg(long, global = true)]
    pub offline: bool,

    /// Ignore fresh cached copies and fetch from the API
    #[arg(long, global = true)]
    pub refresh: bool,

    /// Base URL of the dashboard API
    #[arg(long, global = true, env = "DASHCACHE_API_URL", value_name = "URL")]
    pub api_url: Option<String>,

    /// Bearer token for the dashboard API
    #[arg(long, global = true, env = "DASHCACHE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Cache directory (default: per-origin directory under the user cache dir)
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Dashboard summary figures
    Stats,
    /// List orders
    Orders,
    /// Show a single order with its line items
    Order {
        /// Order id
        id: i64,
    },
    /// List staff members
    Staff,
    /// List products
    Products,
    /// Inspect or maintain the local cache
    #[command(subcommand)]
    Cache(CacheCommand),
    /// Save the connection flags given on this run as the defaults
    Configure,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum CacheCommand {
    /// List cached entries with age, staleness and size
    Status,
    /// Remove cached entries
    Clear {
        /// Only remove keys starting with this prefix (e.g. "order_")
        #[arg(long)]
        prefix: Option<String>,
    },
    /// Remove entries expired beyond the grace period and unreadable entries
    Sweep,
}

impl GlobalArgs {
    /// Layer flag and environment values over the saved config.
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(ref url) = self.api_url {
            config.api_base_url = Some(url.clone());
        }
        if let Some(ref token) = self.token {
            config.api_token = Some(token.clone());
        }
        if let Some(ref dir) = self.cache_dir {
            config.cache_path = Some(dir.clone());
        }
        if self.offline {
            config.start_offline = true;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_order_with_global_flags() {
        let cli = Cli::try_parse_from([
            "dashcache",
            "order",
            "42",
            "--offline",
            "--api-url",
            "https://shop.example.com/api",
        ])
        .unwrap();

        assert_eq!(cli.command, Command::Order { id: 42 });
        assert!(cli.global.offline);
        assert!(!cli.global.refresh);
        assert_eq!(cli.global.api_url.as_deref(), Some("https://shop.example.com/api"));
    }

    #[test]
    fn test_parse_cache_clear_prefix() {
        let cli = Cli::try_parse_from(["dashcache", "cache", "clear", "--prefix", "order_"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Cache(CacheCommand::Clear {
                prefix: Some("order_".to_string())
            })
        );
    }

    #[test]
    fn test_parse_configure() {
        let cli = Cli::try_parse_from(["dashcache", "configure", "--api-url", "https://shop.example.com"]).unwrap();
        assert_eq!(cli.command, Command::Configure);
        assert_eq!(cli.global.api_url.as_deref(), Some("https://shop.example.com"));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["dashcache"]).is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let saved = Config {
            api_base_url: Some("https://old.example.com".to_string()),
            api_token: Some("saved".to_string()),
            ..Default::default()
        };
        let args = GlobalArgs {
            api_url: Some("https://new.example.com".to_string()),
            cache_dir: Some(PathBuf::from("/tmp/dc")),
            offline: true,
            ..Default::default()
        };

        let config = args.apply(saved);
        assert_eq!(config.api_base_url.as_deref(), Some("https://new.example.com"));
        assert_eq!(config.api_token.as_deref(), Some("saved"));
        assert_eq!(config.cache_path, Some(PathBuf::from("/tmp/dc")));
        assert!(config.start_offline);
    }
}
