use crate::fetcher::SweepPolicy;

use super::{types::Config, ConfigError};

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.cache.image_capacity == 0 || config.cache.tag_capacity == 0 {
        return Err(ConfigError::ValidationError(
            "cache capacities must be at least 1".to_string(),
        ));
    }

    if config.fetch.page_size == 0 {
        return Err(ConfigError::ValidationError(
            "fetch.page_size must be at least 1".to_string(),
        ));
    }

    if config.fetch.global_page_cap == 0 {
        return Err(ConfigError::ValidationError(
            "fetch.global_page_cap must be at least 1".to_string(),
        ));
    }

    if config.fetch.page_timeout_secs == 0 || config.resolver.probe_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "timeouts must be at least 1 second".to_string(),
        ));
    }

    if let SweepPolicy::Adaptive {
        wave_size,
        max_empty_waves,
    } = config.fetch.sweep
    {
        if wave_size == 0 || max_empty_waves == 0 {
            return Err(ConfigError::ValidationError(
                "adaptive sweep parameters must be at least 1".to_string(),
            ));
        }
    }

    Ok(())
}
