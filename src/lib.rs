//! Forward HTTP/1.x proxy with an in-memory LRU response cache.
//!
//! # Data Flow
//! ```text
//! Client TCP connection
//!     → net/listener.rs (accept loop, admission gate)
//!     → proxy/worker.rs (receive headers, cache lookup, dispatch)
//!         cache hit  → cache/ (LRU byte store) → reply from memory
//!         cache miss → http/request.rs (parse)
//!                    → net/upstream.rs (resolve + connect)
//!                    → proxy/relay.rs (rewrite, stream, capture)
//!                    → cache insertion on complete responses
//!     → errors mapped to minimal replies by http/response.rs
//! ```

pub mod cache;
pub mod config;
pub mod http;
pub mod net;
pub mod observability;
pub mod proxy;

pub use cache::ResponseCache;
pub use config::ProxyConfig;
pub use net::Listener;
pub use proxy::ProxyServer;
