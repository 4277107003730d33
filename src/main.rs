//! Forward HTTP/1.x caching proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌────────────────────────────────────────────────┐
//!                    │                 FORWARD PROXY                   │
//!                    │                                                 │
//!   Client Request   │  ┌──────────┐   ┌──────────┐   ┌────────────┐  │
//!   ─────────────────┼─▶│   net    │──▶│  proxy   │──▶│   cache    │  │
//!                    │  │ listener │   │  worker  │   │  LRU store │  │
//!                    │  └──────────┘   └────┬─────┘   └────────────┘  │
//!                    │                      │ miss                    │
//!                    │                      ▼                         │
//!   Client Response  │  ┌──────────┐   ┌──────────┐   ┌────────────┐  │
//!   ◀────────────────┼──│  relay   │◀──│ upstream │◀──┼─── Origin   │  │
//!                    │  │ +capture │   │ connect  │   │    Server   │  │
//!                    │  └──────────┘   └──────────┘   └────────────┘  │
//!                    │                                                 │
//!                    │  Cross-cutting: config, observability           │
//!                    └────────────────────────────────────────────────┘
//! ```
//!
//! Invocation: `proxy [port]`. The optional decimal port overrides the
//! configured listener port (default 8080).

use std::path::Path;
use std::sync::Arc;

use forward_proxy::cache::ResponseCache;
use forward_proxy::config;
use forward_proxy::net::Listener;
use forward_proxy::observability;
use forward_proxy::proxy::ProxyServer;

/// Optional configuration file picked up from the working directory.
const CONFIG_FILE: &str = "proxy.toml";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let port_override = match std::env::args().nth(1) {
        Some(raw) => match raw.parse::<u16>() {
            Ok(port) => Some(port),
            Err(_) => {
                eprintln!("Usage: proxy [port]");
                std::process::exit(1);
            }
        },
        None => None,
    };

    let config = config::resolve(Path::new(CONFIG_FILE), port_override)?;

    observability::logging::init(&config.observability.log_level);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "forward-proxy starting");
    tracing::info!(
        port = config.listener.port,
        max_clients = config.listener.max_clients,
        capacity_bytes = config.cache.capacity_bytes,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => observability::metrics::init_exporter(addr),
            Err(_) => {
                tracing::error!(
                    metrics_address = %config.observability.metrics_address,
                    "Failed to parse metrics address"
                );
            }
        }
    }

    let config = Arc::new(config);
    let cache = Arc::new(ResponseCache::from_config(&config.cache));

    let listener = Listener::bind(&config.listener)?;
    let server = ProxyServer::new(listener, cache, config);

    server.run().await;

    Ok(())
}
