//! # Shard Node
//!
//! ```text
//! node-runtime [config.toml]
//! ```
//!
//! Without a file the defaults apply; `SC_*` variables override either.

use anyhow::{Context, Result};
use node_runtime::{init_logging, NodeConfig, ShardNode};
use std::path::PathBuf;
use tokio::sync::watch;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let path = std::env::args().nth(1).map(PathBuf::from);
    let config = NodeConfig::load(path.as_deref()).context("failed to load configuration")?;
    init_logging(&config.logging).context("failed to initialise logging")?;

    info!(
        n_shards = config.n_shards,
        topology = %config.topology,
        config = ?path,
        "starting shard node"
    );
    let node = ShardNode::new(config).context("failed to initialise node")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("ctrl-c received, shutting down"),
            Err(err) => error!(error = %err, "cannot listen for ctrl-c, shutting down"),
        }
        shutdown_tx.send_replace(true);
    });

    node.run(shutdown_rx).await.context("shard node stopped")?;
    info!("shutdown complete");
    Ok(())
}
