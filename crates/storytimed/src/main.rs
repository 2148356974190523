//! Storytime Daemon - children's story generation service
//!
//! Serves the story and parental-settings API over HTTP.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use storytimed::config::Config;
use storytimed::server::{self, AppState};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "storytimed", version, about = "Children's story generation daemon")]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, env = "STORYTIME_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overrides [server].bind_addr
    #[arg(short, long)]
    bind: Option<String>,

    /// Write the default config to the given path and exit
    #[arg(long, value_name = "PATH")]
    init_config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Some(path) = cli.init_config {
        return Config::save_default(&path);
    }

    info!("[BOOT] Storytime Daemon v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(bind) = cli.bind {
        config.server.bind_addr = bind;
    }
    info!(
        "[BOOT] Provider model {} at {} (timeout {}s)",
        config.llm.model, config.llm.endpoint, config.llm.timeout_secs
    );

    let state = AppState::from_config(&config)?;
    info!("[READY] storytimed operational");

    server::run(state, &config.server).await
}
