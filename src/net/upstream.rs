//! Outbound connections to origin servers.

use tokio::net::{lookup_host, TcpStream};

use thiserror::Error;

/// Errors raised while opening an origin connection.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("failed to resolve {host}: {source}")]
    Resolve {
        host: String,
        source: std::io::Error,
    },

    #[error("no IPv4 address for {host}")]
    NoAddress { host: String },

    #[error("failed to connect to {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        source: std::io::Error,
    },
}

/// Resolve `host` with the system resolver and open a TCP connection to the
/// first IPv4 address.
///
/// Any socket opened along the way is closed on failure before the error
/// returns; the OS connect timeout governs, no application timeout applies.
pub async fn connect(host: &str, port: u16) -> Result<TcpStream, UpstreamError> {
    let mut addrs = lookup_host((host, port))
        .await
        .map_err(|source| UpstreamError::Resolve {
            host: host.to_string(),
            source,
        })?;

    let addr = addrs
        .find(|a| a.is_ipv4())
        .ok_or_else(|| UpstreamError::NoAddress {
            host: host.to_string(),
        })?;

    TcpStream::connect(addr)
        .await
        .map_err(|source| UpstreamError::Connect {
            host: host.to_string(),
            port,
            source,
        })
}
