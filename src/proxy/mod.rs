//! Proxying subsystem.
//!
//! # Data Flow
//! ```text
//! Listener yields (stream, peer, permit)
//!     → mod.rs (accept loop, one task per admitted client)
//!     → worker.rs (receive headers, cache lookup, dispatch)
//!     → relay.rs (rewrite request, stream origin response, capture)
//! ```
//!
//! # Design Decisions
//! - The accept loop never waits on a worker; tasks are spawned and detached
//! - Transient accept failures are logged and the loop keeps serving
//! - Only startup (bind/listen) failures are fatal to the process

pub mod relay;
pub mod worker;

use std::sync::Arc;

use crate::cache::ResponseCache;
use crate::config::ProxyConfig;
use crate::net::Listener;

/// The acceptor: owns the listening socket and hands each admitted client to
/// a detached worker task.
pub struct ProxyServer {
    listener: Listener,
    cache: Arc<ResponseCache>,
    config: Arc<ProxyConfig>,
}

impl ProxyServer {
    pub fn new(listener: Listener, cache: Arc<ResponseCache>, config: Arc<ProxyConfig>) -> Self {
        Self {
            listener,
            cache,
            config,
        }
    }

    /// Address the proxy is actually listening on.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, std::io::Error> {
        self.listener.local_addr()
    }

    /// Run the accept loop. Does not return under normal operation.
    pub async fn run(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer, permit)) => {
                    let cache = self.cache.clone();
                    let config = self.config.clone();
                    tokio::spawn(worker::handle_client(stream, peer, permit, cache, config));
                }
                Err(e) => {
                    // Per-connection accept failure; keep serving.
                    tracing::warn!(error = %e, "Accept failed");
                }
            }
        }
    }
}
