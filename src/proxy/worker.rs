//! Per-client worker.
//!
//! # State Machine
//! ```text
//! ┌───────┐    ┌─────────────────┐    ┌────────┐    ┌──────────────────┐
//! │ Admit │───▶│ Receive headers │───▶│ Lookup │───▶│ Parse & dispatch │
//! └───────┘    └───────┬─────────┘    └───┬────┘    └────────┬─────────┘
//!                      │ overflow /       │ hit              │ relay or
//!                      │ truncation       ▼                  │ error reply
//!                      ▼              ┌────────┐             ▼
//!                ┌───────────┐       │ Reply  │        ┌───────────┐
//!                │ Error 400 │       │ cached │        │ Terminate │
//!                └───────────┘       └────────┘        └───────────┘
//! ```
//!
//! # Design Decisions
//! - The admission permit rides with the worker and is released by drop on
//!   every exit path, including panics
//! - Bytes past the header terminator (request bodies) are ignored and never
//!   become part of the cache key
//! - Worker failures never propagate to the accept loop

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::cache::ResponseCache;
use crate::config::ProxyConfig;
use crate::http::request::parse_request;
use crate::http::response::ErrorStatus;
use crate::net::listener::ConnectionPermit;
use crate::observability::metrics;
use crate::proxy::relay;

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// How the header-reception phase ended.
enum Reception {
    /// Full header block, truncated at the terminator.
    Complete(Vec<u8>),
    /// The size ceiling was reached without a terminator.
    TooLarge,
    /// The peer stopped sending mid-headers.
    Truncated,
    /// The peer connected and went away without sending anything.
    Silent,
}

/// Serve one client connection from admission to teardown.
pub async fn handle_client(
    mut stream: TcpStream,
    peer: SocketAddr,
    permit: ConnectionPermit,
    cache: Arc<ResponseCache>,
    config: Arc<ProxyConfig>,
) {
    // Dropped on every exit path, releasing the admission slot exactly once.
    let _permit = permit;

    let reception = receive_headers(
        &mut stream,
        config.limits.max_header_bytes,
        config.limits.io_chunk_bytes,
    )
    .await;

    match reception {
        Reception::Complete(raw) => {
            dispatch(&mut stream, peer, raw, &cache, &config).await;
        }
        Reception::TooLarge => {
            tracing::debug!(peer_addr = %peer, "Header ceiling exceeded");
            respond_error(&mut stream, ErrorStatus::BadRequest).await;
            metrics::record_reply("bad_request");
        }
        Reception::Truncated => {
            tracing::debug!(peer_addr = %peer, "Headers truncated by peer");
            respond_error(&mut stream, ErrorStatus::BadRequest).await;
            metrics::record_reply("bad_request");
        }
        Reception::Silent => {
            tracing::debug!(peer_addr = %peer, "Peer closed without a request");
        }
    }

    let _ = stream.shutdown().await;
}

/// Accumulate header bytes until the terminator, the ceiling, or peer close.
///
/// Reads are capped so the buffer never grows past `max_bytes`; the returned
/// block ends exactly at the terminator.
async fn receive_headers<S>(stream: &mut S, max_bytes: usize, chunk_bytes: usize) -> Reception
where
    S: AsyncRead + Unpin,
{
    let mut buf: Vec<u8> = Vec::new();
    let mut chunk = vec![0u8; chunk_bytes];

    loop {
        let want = chunk_bytes.min(max_bytes - buf.len());
        let n = match stream.read(&mut chunk[..want]).await {
            Ok(0) | Err(_) => {
                return if buf.is_empty() {
                    Reception::Silent
                } else {
                    Reception::Truncated
                };
            }
            Ok(n) => n,
        };

        // The terminator may straddle a chunk boundary; rescan from three
        // bytes before the previous end.
        let scan_from = buf.len().saturating_sub(HEADER_TERMINATOR.len() - 1);
        buf.extend_from_slice(&chunk[..n]);

        if let Some(pos) = find_terminator(&buf[scan_from..]) {
            buf.truncate(scan_from + pos + HEADER_TERMINATOR.len());
            return Reception::Complete(buf);
        }

        if buf.len() >= max_bytes {
            return Reception::TooLarge;
        }
    }
}

fn find_terminator(haystack: &[u8]) -> Option<usize> {
    haystack
        .windows(HEADER_TERMINATOR.len())
        .position(|w| w == HEADER_TERMINATOR)
}

/// Cache lookup, then parse and relay on a miss.
async fn dispatch(
    stream: &mut TcpStream,
    peer: SocketAddr,
    raw: Vec<u8>,
    cache: &ResponseCache,
    config: &ProxyConfig,
) {
    if let Some(cached) = cache.get(&raw) {
        metrics::record_cache_lookup(true);
        tracing::debug!(peer_addr = %peer, bytes = cached.len(), "Serving from cache");
        if let Err(e) = stream.write_all(&cached).await {
            tracing::debug!(peer_addr = %peer, error = %e, "Client went away during cached reply");
        }
        metrics::record_reply("cache_hit");
        return;
    }
    metrics::record_cache_lookup(false);

    let parsed = match parse_request(&raw) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::debug!(peer_addr = %peer, error = %e, "Unparseable request");
            respond_error(stream, ErrorStatus::BadRequest).await;
            metrics::record_reply("bad_request");
            return;
        }
    };

    if parsed.method != "GET" {
        tracing::debug!(peer_addr = %peer, method = %parsed.method, "Method not supported");
        respond_error(stream, ErrorStatus::NotImplemented).await;
        metrics::record_reply("not_implemented");
        return;
    }

    match relay::forward(stream, &parsed, &raw, cache, config.limits.io_chunk_bytes).await {
        Ok(outcome) => {
            tracing::debug!(
                peer_addr = %peer,
                host = %parsed.host,
                bytes = outcome.bytes_to_client,
                stored = outcome.stored,
                "Request relayed"
            );
            metrics::record_reply("relayed");
        }
        Err(e) => {
            tracing::warn!(peer_addr = %peer, host = %parsed.host, error = %e, "Upstream unavailable");
            respond_error(stream, ErrorStatus::InternalServerError).await;
            metrics::record_reply("upstream_failed");
        }
    }
}

/// Best-effort error reply; failures here are swallowed.
async fn respond_error(stream: &mut TcpStream, status: ErrorStatus) {
    let _ = stream.write_all(&status.to_bytes()).await;
}
