//! Shared utilities for integration and load testing.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use forward_proxy::cache::ResponseCache;
use forward_proxy::config::ProxyConfig;
use forward_proxy::net::Listener;
use forward_proxy::proxy::ProxyServer;

/// Start the proxy on an ephemeral local port, sharing the given cache.
pub async fn start_proxy(cache: Arc<ResponseCache>, mut config: ProxyConfig) -> SocketAddr {
    config.listener.bind_address = "127.0.0.1".to_string();
    config.listener.port = 0;

    let config = Arc::new(config);
    let listener = Listener::bind(&config.listener).unwrap();
    let addr = listener.local_addr().unwrap();

    let server = ProxyServer::new(listener, cache, config);
    tokio::spawn(server.run());

    addr
}

/// Open a connection, send the raw request bytes, read the reply to EOF.
pub async fn send_raw(addr: SocketAddr, request: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    response
}

/// Like `send_raw`, but close the write half after sending so the proxy
/// sees EOF mid-request.
#[allow(dead_code)]
pub async fn send_raw_then_close(addr: SocketAddr, request: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();
    stream.shutdown().await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    response
}

/// Start a mock origin that answers every request with a fixed 200 body
/// and counts accepted connections.
pub async fn start_mock_origin(body: &'static str) -> (SocketAddr, Arc<AtomicU32>) {
    start_programmable_origin(move |_| async move { (200, body.to_string()) }).await
}

/// Start a programmable mock origin with async support.
///
/// The closure receives the connection ordinal (starting at 0) and returns
/// the status and body to answer with.
pub async fn start_programmable_origin<F, Fut>(f: F) -> (SocketAddr, Arc<AtomicU32>)
where
    F: Fn(u32) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicU32::new(0));

    let counter = hits.clone();
    let f = Arc::new(f);
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let ordinal = counter.fetch_add(1, Ordering::SeqCst);
                    let f = f.clone();
                    tokio::spawn(async move {
                        read_request_headers(&mut socket).await;

                        let (status, body) = f(ordinal).await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, hits)
}

/// Consume the inbound request up to the header terminator.
async fn read_request_headers(socket: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
        }
    }
}
