//! Configuration validation logic.

use crate::config::schema::ProxyConfig;

/// Error type for configuration validation failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError(pub String);

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Validation error: {}", self.0)
    }
}

/// Validate a ProxyConfig for semantic correctness.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.max_clients == 0 {
        errors.push(ValidationError(
            "listener.max_clients must be > 0".to_string(),
        ));
    }

    if config.cache.capacity_bytes == 0 {
        errors.push(ValidationError(
            "cache.capacity_bytes must be > 0".to_string(),
        ));
    }

    if config.cache.max_entry_bytes > config.cache.capacity_bytes {
        errors.push(ValidationError(format!(
            "cache.max_entry_bytes ({}) exceeds cache.capacity_bytes ({})",
            config.cache.max_entry_bytes, config.cache.capacity_bytes
        )));
    }

    if config.limits.max_header_bytes == 0 {
        errors.push(ValidationError(
            "limits.max_header_bytes must be > 0".to_string(),
        ));
    }

    if config.limits.io_chunk_bytes == 0 {
        errors.push(ValidationError(
            "limits.io_chunk_bytes must be > 0".to_string(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
