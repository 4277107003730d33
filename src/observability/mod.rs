//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters and gauges via the metrics facade)
//!
//! Consumers:
//!     → Log aggregation (stdout, RUST_LOG filtered)
//!     → Metrics endpoint (Prometheus scrape, disabled by default)
//! ```
//!
//! # Design Decisions
//! - Metrics are cheap (atomic increments) and no-ops without an exporter
//! - The exporter is off by default so the proxy port is the only listener

pub mod logging;
pub mod metrics;
