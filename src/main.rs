//! Console edge gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                          ┌──────────────────────────────────────────────┐
//!                          │                 EDGE GATEWAY                  │
//!     Client Request       │  ┌─────────────┐                              │
//!     ─────────────────────┼─▶│ edge router │── redirect / rewrite ──┐     │
//!                          │  └──────┬──────┘                        │     │
//!                          │         │ continue                      │     │
//!                          │         ▼                               ▼     │
//!                          │  ┌─────────────┐               ┌────────────┐ │
//!                          │  │ /api/v1/*   │               │ page relay │─┼──▶ Page renderer
//!                          │  │ reverse     │               └────────────┘ │
//!                          │  │ proxy       │───────────────────────────────┼──▶ API upstream
//!                          │  └─────────────┘                              │
//!                          └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use console_edge::config::{ensure_valid, load_config, resolve_from_env, EdgeConfig};
use console_edge::observability::{logging, metrics};
use console_edge::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "console-edge")]
#[command(about = "Edge router and API reverse proxy for the admin console", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(long)]
    bind: Option<String>,

    /// Override upstream.origin.
    #[arg(long)]
    upstream: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => EdgeConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    if let Some(upstream) = cli.upstream {
        config.upstream.origin = Some(upstream);
    }
    ensure_valid(&config)?;

    logging::init_logging(&config.observability);
    tracing::info!("console-edge v{} starting", env!("CARGO_PKG_VERSION"));

    let upstream = resolve_from_env(&config.upstream);
    match &upstream {
        Ok(origin) => tracing::info!(origin = %origin, "Upstream origin resolved"),
        Err(e) => tracing::error!(error = %e, "Upstream origin unresolved; proxied requests will fail"),
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        frontend = ?config.frontend.origin,
        response_timeout_secs = config.upstream.response_timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, upstream)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
