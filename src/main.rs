//! Local Development HTTP Gateway (devgate)
//!
//! Serves local fixture files, forwards to upstream services, records
//! upstream responses for replay, and falls back to a single-page-app entry
//! file. See the library docs for the pipeline architecture.

use std::path::PathBuf;

use clap::Parser;

use devgate::config::loader::load_or_default;
use devgate::observability::init_tracing;

#[derive(Parser)]
#[command(name = "devgate")]
#[command(about = "Local development HTTP gateway", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "devgate.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_or_default(&cli.config)?;

    tracing::info!(
        config_path = %cli.config.display(),
        port = config.server.port,
        host = %config.server.host,
        local_rules = config.local_rules.len(),
        proxy = config.proxy.is_some(),
        cache = config.cache.is_some(),
        "Configuration loaded"
    );

    let handle = devgate::start(config).await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    handle.stop().await;

    Ok(())
}
