//! Response caching subsystem.
//!
//! # Data Flow
//! ```text
//! worker receives request bytes
//!     → get(raw request) on a hit: reply from memory, entry promoted to front
//!     → miss: relay fetches from origin
//!     → put(raw request, full response) after the upstream stream completes
//!     → eviction from the recency tail keeps used bytes under capacity
//! ```
//!
//! # Design Decisions
//! - Key is the raw request byte sequence up to the header terminator;
//!   byte-exact matching, no normalization
//! - One mutex guards the whole structure; critical sections are pointer
//!   splices and hash updates, so contention stays short
//! - Entries are whole responses only; a partial upstream read is never stored

pub mod lru;

pub use lru::ResponseCache;
