//! API Gateway
//!
//! A small HTTP edge gateway built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                          ┌───────────────────────────────────────────────────┐
//!                          │                   API GATEWAY                      │
//!                          │                                                    │
//!     Client Request       │  ┌─────────┐    ┌──────────┐    ┌────────────┐    │
//!     ─────────────────────┼─▶│  http   │───▶│ routing  │───▶│  rewrite   │    │
//!                          │  │ server  │    │ registry │    │            │    │
//!                          │  └────┬────┘    └────┬─────┘    └─────┬──────┘    │
//!                          │       │ /health      │ no match       │           │
//!                          │       ▼              ▼                ▼           │
//!                          │  ┌─────────┐    ┌──────────┐    ┌────────────┐    │
//!     Client Response      │  │ health  │    │ response │◀───│   proxy    │◀───┼──── Upstream
//!     ◀────────────────────┼──│reporter │    │translator│    │ forwarder  │    │     Service
//!                          │  └─────────┘    └──────────┘    └────────────┘    │
//!                          │                                                    │
//!                          │  config · observability · lifecycle                │
//!                          └───────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use api_gateway::config::{load_config, ObservabilityConfig};
use api_gateway::lifecycle::{signals, Shutdown};
use api_gateway::observability::init_logging;
use api_gateway::GatewayServer;

#[derive(Debug, Parser)]
#[command(name = "api-gateway")]
#[command(about = "HTTP edge gateway routing path prefixes to upstream services", long_about = None)]
struct Cli {
    /// Optional TOML configuration file.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listener bind address (e.g. 127.0.0.1:3000).
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            init_logging(&ObservabilityConfig::default());
            tracing::error!(error = %e, "Invalid configuration, refusing to start");
            return Err(e.into());
        }
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "api-gateway starting");

    let bind_address = config.listener.bind_address.clone();
    let server = GatewayServer::new(config).map_err(|e| {
        tracing::error!(error = %e, "Invalid route table, refusing to start");
        e
    })?;

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    signals::spawn_signal_handler(shutdown);

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
