//! akvio-tui — terminal query editor for Akvio device data.
//!
//! Wires the platform client, the in-process query store, and the
//! cascade controller together, then hands control to the [`App`]
//! event loop.

mod action;
mod app;
mod component;
mod config;
mod data_bridge;
mod event;
mod theme;
mod tui;
mod widgets;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::Result;
use secrecy::SecretString;
use tracing::info;

use akvio_api::PlatformClient;
use akvio_core::{CascadeController, MemoryQueryStore};

use crate::app::App;

#[derive(Parser, Debug)]
#[command(
    name = "akvio-tui",
    version,
    about = "Terminal query editor for Akvio device data"
)]
struct Cli {
    /// Path to a config file (defaults to the platform config dir).
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Platform base URL (overrides the config file).
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// API key (overrides the config file).
    #[arg(long, env = "AKVIO_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Log filter, e.g. `debug` or `akvio_core=trace`.
    #[arg(long, value_name = "FILTER")]
    log: Option<String>,
}

/// Set up file logging; stdout belongs to the TUI.
fn init_logging(filter: &str) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_dir = directories::ProjectDirs::from("io", "akvio", "akvio-tui")
        .map_or_else(|| PathBuf::from("."), |dirs| dirs.data_local_dir().to_path_buf());
    std::fs::create_dir_all(&log_dir)?;

    let appender = tracing_appender::rolling::daily(&log_dir, "akvio-tui.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = tracing_subscriber::EnvFilter::try_new(filter)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let mut config = config::load(cli.config.as_deref())?;
    if let Some(url) = cli.url {
        config.platform_url = url;
    }
    if let Some(key) = cli.api_key {
        config.api_key = SecretString::from(key);
    }
    if let Some(filter) = cli.log {
        config.log_filter = filter;
    }

    let _log_guard = init_logging(&config.log_filter)?;
    info!(url = %config.platform_url, "starting query editor");

    let client = Arc::new(PlatformClient::from_api_key(
        &config.platform_url,
        &config.api_key,
    )?);
    let source_id = client.identity().to_owned();

    let store = Arc::new(MemoryQueryStore::default());
    let controller = CascadeController::new(client, store.clone());

    App::new(controller, store, source_id).run().await
}
