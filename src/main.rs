//! Route lookup proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ───────────────▶ request id ─▶ access log ─▶ route lookup ──┬─▶ proxy ─▶ Endpoint
//!                                                     │            │
//!                                                     ▼            │
//!                                               InMemoryRegistry   │
//!                                                     ▲            ▼
//!                                config watcher ──────┘      404 unknown_route
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use route_lookup::config::{load_config, watcher::ConfigWatcher, LookupConfig};
use route_lookup::lifecycle::{signals, Shutdown};
use route_lookup::observability::{logging, metrics};
use route_lookup::{HttpServer, InMemoryRegistry};

#[derive(Debug, Parser)]
#[command(name = "route-lookup", version, about = "Reverse proxy route lookup stage")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload the route table when the configuration file changes.
    #[arg(long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => LookupConfig::default(),
    };

    logging::init(&config.observability)?;
    tracing::info!("route-lookup v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let registry = Arc::new(InMemoryRegistry::from_config(&config.routes));
    tracing::info!(
        uris = registry.num_uris(),
        endpoints = registry.num_endpoints(),
        "Route table loaded"
    );

    // Held for the life of the process; dropping it stops the watch.
    let _watcher = match (&args.config, args.watch) {
        (Some(path), true) => {
            let (watcher, mut updates) = ConfigWatcher::new(path);
            let handle = watcher.run()?;
            let registry = registry.clone();
            tokio::spawn(async move {
                while let Some(new_config) = updates.recv().await {
                    registry.replace_all(&new_config.routes);
                    tracing::info!(
                        uris = registry.num_uris(),
                        endpoints = registry.num_endpoints(),
                        "Route table reloaded"
                    );
                }
            });
            Some(handle)
        }
        (None, true) => {
            tracing::warn!("--watch ignored: no --config file given");
            None
        }
        _ => None,
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        max_connections = config.listener.max_connections,
        request_timeout_secs = config.timeouts.request_secs,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move { signals::shutdown_on_ctrl_c(&shutdown).await });

    let server = HttpServer::new(config, registry, Arc::new(metrics::PrometheusReporter));
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
