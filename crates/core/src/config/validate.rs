use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Catalog API key is not empty
/// - Server port is not 0
/// - Search minimum query length is at least 1
/// - Rating scale and storage key are usable
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.catalog.api_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "catalog.api_key cannot be empty".to_string(),
        ));
    }

    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.search.min_query_len == 0 {
        return Err(ConfigError::ValidationError(
            "search.min_query_len must be at least 1".to_string(),
        ));
    }

    if !(1..=100).contains(&config.rating.max_rating) {
        return Err(ConfigError::ValidationError(format!(
            "rating.max_rating must be between 1 and 100, got {}",
            config.rating.max_rating
        )));
    }

    if config.storage.watched_key.is_empty() {
        return Err(ConfigError::ValidationError(
            "storage.watched_key cannot be empty".to_string(),
        ));
    }

    Ok(())
}
