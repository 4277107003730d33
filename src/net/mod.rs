//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, admission gate)
//!     → Hand off to the per-client worker
//!
//! Outgoing TCP connection
//!     → upstream.rs (resolve origin host, connect over IPv4)
//!     → Hand off to the relay
//! ```
//!
//! Writes to a peer that has gone away surface as `io::Error`
//! (`BrokenPipe`); the Rust runtime masks `SIGPIPE` before `main` runs, so
//! no send path can take down the process.

pub mod listener;
pub mod upstream;

pub use listener::{ConnectionPermit, Listener, ListenerError};
pub use upstream::{connect, UpstreamError};
