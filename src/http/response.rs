//! Minimal error replies sent on the proxy's own behalf.
//!
//! Relayed upstream responses never pass through here; they are copied to the
//! client verbatim by the relay.

use std::time::SystemTime;

/// Status codes the proxy emits itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStatus {
    /// Malformed, truncated, or oversized request.
    BadRequest,
    /// Upstream could not be reached or refused the rewritten request.
    InternalServerError,
    /// Any method other than GET.
    NotImplemented,
}

impl ErrorStatus {
    pub fn code(self) -> u16 {
        match self {
            ErrorStatus::BadRequest => 400,
            ErrorStatus::InternalServerError => 500,
            ErrorStatus::NotImplemented => 501,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            ErrorStatus::BadRequest => "Bad Request",
            ErrorStatus::InternalServerError => "Internal Server Error",
            ErrorStatus::NotImplemented => "Not Implemented",
        }
    }

    /// Render the complete wire-form reply: empty body, closing connection,
    /// RFC 1123 date.
    pub fn to_bytes(self) -> Vec<u8> {
        format!(
            "HTTP/1.1 {} {}\r\nContent-Length: 0\r\nConnection: close\r\nDate: {}\r\n\r\n",
            self.code(),
            self.reason(),
            httpdate::fmt_http_date(SystemTime::now()),
        )
        .into_bytes()
    }
}
