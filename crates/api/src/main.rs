//! Movement Coach - Main Entry Point

use anyhow::Context;
use api::{init_logging, run_server, AppConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("loading configuration")?;
    init_logging(&config.logging)?;

    info!("=== Movement Coach v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Starting movement analysis server...");

    run_server(config).await?;

    Ok(())
}
