//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Raw header block (terminated by \r\n\r\n)
//!     → request.rs (split into method, target, version, host, port, headers)
//!     → [worker decides: cached reply, relay, or error]
//!     → response.rs (minimal error replies with Date header)
//! ```

pub mod request;
pub mod response;

pub use request::{parse_request, ParseError, ParsedRequest};
pub use response::ErrorStatus;
