//! TCP listener implementation with backpressure.
//!
//! # Responsibilities
//! - Bind to the configured address with `SO_REUSEADDR`
//! - Accept incoming TCP connections
//! - Enforce the max_clients limit via semaphore
//! - Graceful handling of accept errors

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpSocket, TcpStream};
use tokio::sync::Semaphore;

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug)]
pub enum ListenerError {
    /// Failed to bind or listen on the address.
    Bind(std::io::Error),
    /// Failed to accept a connection.
    Accept(std::io::Error),
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::Bind(e) => write!(f, "Failed to bind: {}", e),
            ListenerError::Accept(e) => write!(f, "Failed to accept: {}", e),
        }
    }
}

impl std::error::Error for ListenerError {}

/// A bounded TCP listener that limits concurrent connections.
///
/// Uses a semaphore to enforce `max_clients`. When the limit is reached,
/// the accept loop waits until a slot becomes available; pending connections
/// queue in the listen backlog, which is sized to the same limit.
pub struct Listener {
    /// The underlying TCP listener.
    inner: tokio::net::TcpListener,
    /// Semaphore limiting concurrent clients.
    admission: Arc<Semaphore>,
    /// Configured maximum concurrent clients.
    max_clients: usize,
}

impl Listener {
    /// Bind to the configured address with connection limits.
    pub fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let addr: SocketAddr = format!("{}:{}", config.bind_address, config.port)
            .parse()
            .map_err(|e| {
                ListenerError::Bind(std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
            })?;

        let socket = TcpSocket::new_v4().map_err(ListenerError::Bind)?;
        socket.set_reuseaddr(true).map_err(ListenerError::Bind)?;
        socket.bind(addr).map_err(ListenerError::Bind)?;

        let listener = socket
            .listen(config.max_clients as u32)
            .map_err(ListenerError::Bind)?;

        let local_addr = listener.local_addr().map_err(ListenerError::Bind)?;

        tracing::info!(
            address = %local_addr,
            max_clients = config.max_clients,
            "Listener bound"
        );

        Ok(Self {
            inner: listener,
            admission: Arc::new(Semaphore::new(config.max_clients)),
            max_clients: config.max_clients,
        })
    }

    /// Accept a new connection, respecting the admission limit.
    ///
    /// This will wait if the limit has been reached. Returns the stream and a
    /// permit that must be held for the connection's lifetime.
    pub async fn accept(
        &self,
    ) -> Result<(TcpStream, SocketAddr, ConnectionPermit), ListenerError> {
        // Acquire the admission slot first (backpressure)
        let permit = self
            .admission
            .clone()
            .acquire_owned()
            .await
            .expect("Semaphore closed unexpectedly");

        // Then accept the connection
        let (stream, addr) = self.inner.accept().await.map_err(ListenerError::Accept)?;

        tracing::debug!(
            peer_addr = %addr,
            available_permits = self.admission.available_permits(),
            "Connection accepted"
        );

        Ok((stream, addr, ConnectionPermit { _permit: permit }))
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.inner.local_addr()
    }

    /// Get current available admission slots.
    pub fn available_permits(&self) -> usize {
        self.admission.available_permits()
    }

    /// Get configured maximum concurrent clients.
    pub fn max_clients(&self) -> usize {
        self.max_clients
    }
}

/// A permit representing one admission slot.
///
/// When dropped, the slot is released back to the gate. This holds even if
/// the worker holding it panics, so each admitted client releases exactly
/// once.
#[derive(Debug)]
pub struct ConnectionPermit {
    _permit: tokio::sync::OwnedSemaphorePermit,
}
