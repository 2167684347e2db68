//! Request-Validation and Rate-Limiting Gateway
//!
//! A production-ready edge guard built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────┐
//!                      │                    GATEWAY                       │
//!                      │                                                  │
//!   Client Request     │  ┌─────────┐   ┌──────────┐   ┌──────────────┐  │
//!   ───────────────────┼─▶│  http   │──▶│ routing  │──▶│    gate      │  │
//!                      │  │ server  │   │  scope   │   │   keeper     │  │
//!                      │  └─────────┘   └──────────┘   └──────┬───────┘  │
//!                      │                                      │          │
//!                      │             admit ◀──────────────────┤          │
//!                      │               │                reject│          │
//!                      │               ▼                      ▼          │
//!   Client Response    │  ┌──────────────┐          ┌──────────────┐     │
//!   ◀──────────────────┼──│   upstream   │          │ typed error  │     │
//!                      │  │   forward    │          │   response   │     │
//!                      │  └──────────────┘          └──────────────┘     │
//!                      │                                                  │
//!                      │  ┌────────────────────────────────────────────┐ │
//!                      │  │            Cross-Cutting Concerns          │ │
//!                      │  │  ┌────────┐ ┌──────────┐ ┌─────────────┐  │ │
//!                      │  │  │ config │ │ security │ │ observ-     │  │ │
//!                      │  │  │ +reload│ │ +limits  │ │ ability     │  │ │
//!                      │  │  └────────┘ └──────────┘ └─────────────┘  │ │
//!                      │  │  ┌──────────────┐  ┌───────────────────┐  │ │
//!                      │  │  │  validation  │  │     lifecycle     │  │ │
//!                      │  │  │  structural  │  │ startup/shutdown  │  │ │
//!                      │  │  └──────────────┘  └───────────────────┘  │ │
//!                      │  └────────────────────────────────────────────┘ │
//!                      └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use edge_guard::config::loader::load_config;
use edge_guard::config::watcher::ConfigWatcher;
use edge_guard::config::GatewayConfig;
use edge_guard::http::HttpServer;
use edge_guard::lifecycle::{signals, Shutdown};
use edge_guard::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "edge-guard")]
#[command(about = "Request-validation and rate-limiting gateway", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability.log_level);

    tracing::info!("edge-guard v0.1.0 starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        window_ms = config.rate_limit.window_ms,
        max_requests = config.rate_limit.max_requests,
        max_payload_bytes = config.limits.max_payload_bytes,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    // Hot reload only when a config file is in play. The watcher handle
    // must stay alive for the watch to keep running.
    let (config_updates, _watcher) = match &cli.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (updates, Some(watcher.run()?))
        }
        None => {
            let (_tx, updates) = mpsc::unbounded_channel();
            (updates, None)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        signals::wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
