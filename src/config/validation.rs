use crate::config::types::{Config, OutputConfig, ProviderConfig, QueueConfig, StatusConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_provider_config(&config.provider)?;
    validate_queue_config(&config.queues)?;
    validate_status_config(&config.status)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates provider configuration
fn validate_provider_config(config: &ProviderConfig) -> Result<(), ConfigError> {
    let base = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if base.scheme() != "https" && base.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must use http or https, got '{}'",
            base.scheme()
        )));
    }

    if base.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' cannot have paths joined onto it",
            config.base_url
        )));
    }

    validate_segment("title", &config.title)?;

    if config.collectible_id.is_empty() || !config.collectible_id.chars().all(|c| c.is_ascii_digit())
    {
        return Err(ConfigError::Validation(format!(
            "collectible-id must be a non-empty decimal hash, got '{}'",
            config.collectible_id
        )));
    }

    Ok(())
}

/// Validates a value that is used verbatim as a URL path segment
fn validate_segment(name: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
    }

    if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(ConfigError::Validation(format!(
            "{} must contain only alphanumeric characters, '-' or '_', got '{}'",
            name, value
        )));
    }

    Ok(())
}

/// Validates worker pool sizes
fn validate_queue_config(config: &QueueConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("inspect-concurrency", config.inspect_concurrency),
        ("report-concurrency", config.report_concurrency),
    ] {
        if !(1..=100).contains(&value) {
            return Err(ConfigError::Validation(format!(
                "{} must be between 1 and 100, got {}",
                name, value
            )));
        }
    }

    Ok(())
}

fn validate_status_config(config: &StatusConfig) -> Result<(), ConfigError> {
    if config.report_interval < 10 {
        return Err(ConfigError::Validation(format!(
            "report-interval must be >= 10ms, got {}ms",
            config.report_interval
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.cache_path.is_empty() {
        return Err(ConfigError::Validation(
            "cache-path cannot be empty".to_string(),
        ));
    }

    if config.results_path.is_empty() {
        return Err(ConfigError::Validation(
            "results-path cannot be empty".to_string(),
        ));
    }

    if config.cache_path == config.results_path {
        return Err(ConfigError::Validation(
            "cache-path and results-path must differ".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> ProviderConfig {
        ProviderConfig {
            base_url: "https://www.bungie.net/Platform".to_string(),
            api_key: String::new(),
            title: "Destiny2".to_string(),
            collectible_id: "319846607".to_string(),
            request_timeout: 0,
        }
    }

    #[test]
    fn test_validate_provider() {
        assert!(validate_provider_config(&provider()).is_ok());

        let mut bad_scheme = provider();
        bad_scheme.base_url = "ftp://example.com/".to_string();
        assert!(validate_provider_config(&bad_scheme).is_err());

        let mut not_a_base = provider();
        not_a_base.base_url = "mailto:someone@example.com".to_string();
        assert!(validate_provider_config(&not_a_base).is_err());

        let mut bad_collectible = provider();
        bad_collectible.collectible_id = "abc".to_string();
        assert!(validate_provider_config(&bad_collectible).is_err());
    }

    #[test]
    fn test_validate_segment() {
        assert!(validate_segment("title", "Destiny2").is_ok());
        assert!(validate_segment("title", "").is_err());
        assert!(validate_segment("title", "a/b").is_err());
        assert!(validate_segment("title", "a b").is_err());
    }

    #[test]
    fn test_validate_queue_bounds() {
        assert!(validate_queue_config(&QueueConfig::default()).is_ok());
        assert!(validate_queue_config(&QueueConfig {
            inspect_concurrency: 0,
            report_concurrency: 10,
        })
        .is_err());
        assert!(validate_queue_config(&QueueConfig {
            inspect_concurrency: 5,
            report_concurrency: 101,
        })
        .is_err());
    }

    #[test]
    fn test_validate_output_paths_differ() {
        let same = OutputConfig {
            cache_path: "data/x".to_string(),
            results_path: "data/x".to_string(),
        };
        assert!(validate_output_config(&same).is_err());
    }
}
