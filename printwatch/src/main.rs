use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use printwatch::config::DEFAULT_CONFIG_FILE;
use printwatch::{AppConfig, Supervisor};

/// Discord notifications for Bambu Lab printers
#[derive(Debug, Parser)]
#[command(name = "printwatch", version, about)]
struct Args {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = AppConfig::load(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;

    if let Some(dir) = config.debug_log_dir() {
        info!("Saving snapshot dumps to {}", dir.display());
    }

    let mut supervisor = Supervisor::start(&config)?;

    tokio::select! {
        _ = supervisor.wait() => warn!("All monitors have stopped"),
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for Ctrl-C")?;
            info!("Shutting down...");
        }
    }

    supervisor.shutdown().await;
    Ok(())
}
