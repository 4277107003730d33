//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! proxy.toml (optional, working directory)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → shared via Arc to the acceptor and workers
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload path
//! - All fields have defaults so the binary runs with no file at all
//! - The CLI port argument overrides whatever the file or defaults say
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, resolve, ConfigError};
pub use schema::{CacheConfig, LimitsConfig, ListenerConfig, ObservabilityConfig, ProxyConfig};
pub use validation::validate_config;
