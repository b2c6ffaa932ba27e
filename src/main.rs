mod config;
mod dispatch;
mod error;
mod exif_writer;
mod export;
mod extractors;
mod gps;
mod metadata;
mod session;
mod web_server;

use crate::config::AppConfig;
use anyhow::Result;
use clap::Parser;
use log::info;

#[derive(Parser, Debug)]
#[command(
    name = "metadata-hub",
    about = "Upload a file, inspect and edit its metadata, download the result"
)]
struct Args {
    /// Directory holding the layered configuration files
    #[arg(long, default_value = "config")]
    config_dir: String,

    /// Override the configured web port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = AppConfig::new(&args.config_dir)?;
    if let Some(port) = args.port {
        config.web_port = port;
    }

    // Initialize env_logger based on config.log_level
    env_logger::Builder::new()
        .filter_level(config.log_level.parse().unwrap_or(log::LevelFilter::Info))
        .init();

    info!("Starting metadata-hub");

    if let Err(e) = web_server::start_web_server(config).await {
        log::error!("Web server error: {}", e);
    }

    info!("metadata-hub finished");

    Ok(())
}
