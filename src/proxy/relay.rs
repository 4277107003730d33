//! Request rewriting and upstream relay.
//!
//! # Responsibilities
//! - Rebuild the outbound request: original headers minus `Host` and
//!   `Connection`, then `Host: <origin>` and `Connection: close`
//! - Stream the origin's response to the client while capturing it
//! - Insert only complete responses into the cache
//!
//! # Design Decisions
//! - `Connection: close` keeps the origin exchange single-shot, so end of
//!   stream is end of response and no upstream framing is needed
//! - A failure mid-stream (either side) drops the captured bytes; a response
//!   the client did not fully receive is never served to the next client

use std::fmt::Write as _;

use bytes::Bytes;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::cache::ResponseCache;
use crate::http::request::ParsedRequest;
use crate::net::upstream::{self, UpstreamError};

/// Origin port when the request names none.
const DEFAULT_HTTP_PORT: u16 = 80;

/// Failures that occur before any response byte reaches the client.
///
/// Anything later is handled inside the relay loop: the client already saw
/// data, so there is no useful error reply left to send.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("failed to send rewritten request: {0}")]
    SendRequest(std::io::Error),

    #[error("upstream failed before any response bytes: {0}")]
    Receive(std::io::Error),
}

/// What the relay accomplished.
#[derive(Debug)]
pub struct RelayOutcome {
    /// Bytes actually delivered to the client.
    pub bytes_to_client: usize,
    /// Whether the complete response was inserted into the cache.
    pub stored: bool,
}

/// Fetch the parsed request from its origin and stream the response back.
///
/// The raw request bytes become the cache key; insertion happens only when
/// the origin stream ends at EOF with the client still connected.
pub async fn forward(
    client: &mut TcpStream,
    request: &ParsedRequest,
    raw_request: &[u8],
    cache: &ResponseCache,
    chunk_bytes: usize,
) -> Result<RelayOutcome, RelayError> {
    let outbound = rewrite_request(request);
    let port = request.port.unwrap_or(DEFAULT_HTTP_PORT);

    let mut origin = upstream::connect(&request.host, port).await?;
    origin
        .write_all(&outbound)
        .await
        .map_err(RelayError::SendRequest)?;

    let mut chunk = vec![0u8; chunk_bytes];
    let mut captured: Vec<u8> = Vec::new();
    let mut bytes_to_client = 0usize;
    let mut interrupted = false;

    loop {
        let n = match origin.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                if bytes_to_client == 0 {
                    return Err(RelayError::Receive(e));
                }
                tracing::warn!(
                    host = %request.host,
                    error = %e,
                    "Upstream read failed mid-stream, dropping response"
                );
                interrupted = true;
                break;
            }
        };

        captured.extend_from_slice(&chunk[..n]);

        if let Err(e) = client.write_all(&chunk[..n]).await {
            tracing::debug!(error = %e, "Client went away mid-relay");
            interrupted = true;
            break;
        }
        bytes_to_client += n;
    }

    let stored = !interrupted;
    if stored {
        cache.put(raw_request, Bytes::from(captured));
    }

    let _ = origin.shutdown().await;

    Ok(RelayOutcome {
        bytes_to_client,
        stored,
    })
}

/// Rebuild the request for the origin.
///
/// Request line, original headers except `Host` and `Connection`
/// (case-insensitive), then the derived `Host` and a forced
/// `Connection: close`.
fn rewrite_request(request: &ParsedRequest) -> Vec<u8> {
    let mut out = String::with_capacity(256);

    let _ = write!(
        out,
        "{} {} HTTP/1.{}\r\n",
        request.method, request.path, request.minor_version
    );

    for (name, value) in &request.headers {
        if name.eq_ignore_ascii_case("host") || name.eq_ignore_ascii_case("connection") {
            continue;
        }
        let _ = write!(out, "{}: {}\r\n", name, value);
    }

    let _ = write!(out, "Host: {}\r\nConnection: close\r\n\r\n", request.host);

    out.into_bytes()
}
