//! Configuration validation
//!
//! Sanity checks applied after parsing, before any network or database work.

use crate::config::Config;
use crate::ConfigError;

/// Validates a parsed configuration
///
/// # Errors
///
/// Returns `ConfigError::Validation` describing the first problem found.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.store.database_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "store.database-path must not be empty".to_string(),
        ));
    }

    let url = &config.platform.discover_url;
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "platform.discover-url must be an http(s) URL, got: {}",
            url
        )));
    }

    if config.platform.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "platform.request-timeout-secs must be at least 1".to_string(),
        ));
    }

    if config.platform.request_limit == 0 {
        return Err(ConfigError::Validation(
            "platform.request-limit must be at least 1".to_string(),
        ));
    }

    Ok(())
}
