//! # DAOWatch Daemon
//!
//! Entry point: logging, configuration, context wiring, then the
//! scheduler loop until ctrl-c. Startup validation failures exit
//! non-zero; the outer HTTP surface mounts the webhook services from
//! the context.

use anyhow::Context as _;
use node_runtime::{AppContextBuilder, RuntimeConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = RuntimeConfig::from_env().context("invalid configuration")?;
    info!(network = %config.network, "starting daowatch");

    let context = AppContextBuilder::new(config)
        .build()
        .context("failed to wire application context")?;

    context.run().await.context("runtime failed")?;
    info!("shutdown complete");
    Ok(())
}
