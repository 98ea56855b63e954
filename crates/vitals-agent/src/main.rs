//! vitals agent (standalone)
//!
//! Runs the agent against its own process and prints every payload as a JSON
//! line on stdout. Useful to watch what a host would ship to its collector.

use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use vitals_agent::runtime::CountingAllocator;
use vitals_agent::transport::StdoutTransport;
use vitals_agent::{config, AgentHandle};
use vitals_core::error::{Result, VitalsError};

#[global_allocator]
static ALLOC: CountingAllocator = CountingAllocator;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays a clean payload stream.
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "vitals.yaml".to_string());
    let cfg = config::load_from_file(&path)?;

    let agent = AgentHandle::builder(cfg)
        .transport(Arc::new(StdoutTransport::new()))
        .start()
        .await?;

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| VitalsError::Internal(format!("signal handler failed: {e}")))?;

    tracing::info!(name = %agent.cfg().agent.name, "shutting down");
    agent.shutdown().await;
    Ok(())
}
