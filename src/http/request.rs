//! Request parsing.
//!
//! # Responsibilities
//! - Split a raw header block into method, path, version, and headers
//! - Derive the origin host and port (absolute-form target first, else Host)
//! - Preserve header order and spelling for faithful forwarding
//!
//! # Design Decisions
//! - `httparse` does the line/header splitting; this module owns the result
//! - A proxy target in absolute form carries the authority in the request
//!   line; origin-form requests must carry a Host header instead
//! - A non-numeric port is rejected here rather than at connect time

use thiserror::Error;

/// Upper bound on header lines a single request may carry.
const MAX_HEADERS: usize = 64;

/// A parsed client request, read-only after construction.
#[derive(Debug, Clone)]
pub struct ParsedRequest {
    pub method: String,
    /// Origin-form path to request from the upstream (always starts with `/`).
    pub path: String,
    /// HTTP minor version (0 or 1).
    pub minor_version: u8,
    /// Origin host, without port.
    pub host: String,
    /// Explicit port from the target or Host header, if any.
    pub port: Option<u16>,
    /// Header (name, value) pairs in arrival order, original spelling.
    pub headers: Vec<(String, String)>,
}

/// Reasons a header block fails to parse into a usable request.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed request: {0}")]
    Malformed(httparse::Error),

    #[error("request headers are incomplete")]
    Incomplete,

    #[error("header value is not valid UTF-8")]
    HeaderEncoding,

    #[error("no host in request target or Host header")]
    MissingHost,

    #[error("invalid port in request target")]
    InvalidPort,
}

/// Parse a header block (everything up to and including `\r\n\r\n`).
pub fn parse_request(raw: &[u8]) -> Result<ParsedRequest, ParseError> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut req = httparse::Request::new(&mut headers);

    match req.parse(raw) {
        Ok(httparse::Status::Complete(_)) => {}
        Ok(httparse::Status::Partial) => return Err(ParseError::Incomplete),
        Err(e) => return Err(ParseError::Malformed(e)),
    }

    let method = req.method.ok_or(ParseError::Incomplete)?.to_string();
    let target = req.path.ok_or(ParseError::Incomplete)?;
    let minor_version = req.version.ok_or(ParseError::Incomplete)?;

    let headers = req
        .headers
        .iter()
        .map(|h| {
            let value = std::str::from_utf8(h.value).map_err(|_| ParseError::HeaderEncoding)?;
            Ok((h.name.to_string(), value.to_string()))
        })
        .collect::<Result<Vec<_>, ParseError>>()?;

    let (path, host, port) = split_target(target, &headers)?;

    Ok(ParsedRequest {
        method,
        path,
        minor_version,
        host,
        port,
        headers,
    })
}

/// Resolve the upstream authority and origin-form path for a request target.
fn split_target(
    target: &str,
    headers: &[(String, String)],
) -> Result<(String, String, Option<u16>), ParseError> {
    if let Some(rest) = strip_http_scheme(target) {
        // Absolute form: authority is embedded in the request line.
        let (authority, path) = match rest.find('/') {
            Some(i) => (&rest[..i], &rest[i..]),
            None => (rest, "/"),
        };
        let (host, port) = split_authority(authority)?;
        if host.is_empty() {
            return Err(ParseError::MissingHost);
        }
        Ok((path.to_string(), host.to_string(), port))
    } else {
        // Origin form: the Host header names the upstream.
        let authority = headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("host"))
            .map(|(_, value)| value.trim())
            .ok_or(ParseError::MissingHost)?;
        let (host, port) = split_authority(authority)?;
        if host.is_empty() {
            return Err(ParseError::MissingHost);
        }
        Ok((target.to_string(), host.to_string(), port))
    }
}

fn strip_http_scheme(target: &str) -> Option<&str> {
    let bytes = target.as_bytes();
    if bytes.len() >= 7 && bytes[..7].eq_ignore_ascii_case(b"http://") {
        Some(&target[7..])
    } else {
        None
    }
}

fn split_authority(authority: &str) -> Result<(&str, Option<u16>), ParseError> {
    match authority.rsplit_once(':') {
        Some((host, port)) => {
            let port = port.parse::<u16>().map_err(|_| ParseError::InvalidPort)?;
            Ok((host, Some(port)))
        }
        None => Ok((authority, None)),
    }
}
