//! dashcache - command-line admin dashboard.
//!
//! Prints orders, staff, products and summary statistics from the dashboard
//! API, answering from the local cache when the data is fresh, when the
//! network is down, or when a refresh fails.

mod cli;
mod render;

use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use dashcache_core::resources::Resource;
use dashcache_core::{CachedDataController, Config, Dashboard};
use serde::{de::DeserializeOwned, Serialize};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{CacheCommand, Cli, Command};

/// Initialize the tracing subscriber for logging.
///
/// The returned guard flushes the log file on drop and must outlive `main`'s work.
fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let file_name = path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("Invalid log file path: {}", path.display()))?;
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.global.log_file.as_deref())?;
    info!("dashcache starting");

    let config = cli.global.apply(Config::load().context("Failed to load configuration")?);
    let force_refresh = cli.global.refresh;

    match cli.command {
        Command::Cache(command) => run_cache_command(&config, command),
        Command::Configure => {
            config.save().context("Failed to save configuration")?;
            println!("Saved configuration");
            Ok(())
        }
        Command::Stats => {
            let dashboard = connect(&config)?;
            show(Resource::DashboardStats, dashboard.stats(), force_refresh, render::stats).await
        }
        Command::Orders => {
            let dashboard = connect(&config)?;
            show(Resource::OrdersList, dashboard.orders(), force_refresh, |o| render::orders(o)).await
        }
        Command::Order { id } => {
            let dashboard = connect(&config)?;
            show(Resource::OrderDetail(id), dashboard.order(id), force_refresh, render::order).await
        }
        Command::Staff => {
            let dashboard = connect(&config)?;
            show(Resource::StaffList, dashboard.staff(), force_refresh, |s| render::staff(s)).await
        }
        Command::Products => {
            let dashboard = connect(&config)?;
            show(Resource::ProductsList, dashboard.products(), force_refresh, |p| render::products(p)).await
        }
    }
}

fn connect(config: &Config) -> Result<Dashboard> {
    Dashboard::from_config(config).context("Set the API URL with --api-url or DASHCACHE_API_URL")
}

/// Fetch through the controller and print the data with its freshness line.
async fn show<T, F>(
    resource: Resource,
    controller: CachedDataController<T>,
    force_refresh: bool,
    format: F,
) -> Result<()>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    F: FnOnce(&T) -> String,
{
    let outcome = controller.fetch_data(force_refresh).await?;

    println!("{}", resource.title());
    print!("{}", format(&outcome.data));
    println!("({})", render::freshness_line(&outcome));
    if let Some(warning) = outcome.warning {
        eprintln!("Warning: {}", warning);
    }
    Ok(())
}

fn run_cache_command(config: &Config, command: CacheCommand) -> Result<()> {
    let store = Dashboard::open_store(config)?;

    match command {
        CacheCommand::Status => {
            print!("{}", render::cache_status(&store.entries(), store.size_bytes()));
        }
        CacheCommand::Clear { prefix } => {
            let removed = match prefix {
                Some(ref prefix) => store.remove_prefix(prefix)?,
                None => store.clear_all()?,
            };
            println!("Removed {} cached entries", removed);
        }
        CacheCommand::Sweep => {
            let removed = store.clear_old_cache();
            println!("Swept {} old entries", removed);
        }
    }
    Ok(())
}
