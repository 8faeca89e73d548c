//! Server entry point for media-dl.

use std::sync::Arc;

use clap::Parser;
use media_dl::{Config, MediaDownloader, run_server};
use tracing::{debug, info};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(args.default_log_level()));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    config.server.api.bind_address = args.bind_address(config.server.api.bind_address);

    info!(
        bind = %config.server.api.bind_address,
        temp_dir = %config.download.temp_dir.display(),
        max_concurrent = config.download.max_concurrent_downloads,
        "media-dl starting"
    );

    let downloader = Arc::new(MediaDownloader::new(config).await?);
    info!(engine = downloader.engine_name(), "fetch engine ready");

    run_server(downloader).await?;

    info!("media-dl stopped");
    Ok(())
}
