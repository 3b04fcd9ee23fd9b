use crate::config::types::{HttpConfig, RequestConfig, ScraperConfig, StorageConfig};
use crate::storage::StorageFormat;
use crate::ConfigError;
use reqwest::header::{HeaderName, HeaderValue};

/// Validates the entire configuration
pub fn validate(config: &ScraperConfig) -> Result<(), ConfigError> {
    validate_request_config(&config.requests)?;
    validate_http_config(&config.http)?;
    validate_storage_config(&config.storage)?;
    Ok(())
}

/// Validates pacing and retry settings
fn validate_request_config(config: &RequestConfig) -> Result<(), ConfigError> {
    if config.max_concurrent < 1 || config.max_concurrent > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent must be between 1 and 100, got {}",
            config.max_concurrent
        )));
    }

    if config.timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "timeout_ms must be greater than 0".to_string(),
        ));
    }

    if config.backoff_base_ms > config.backoff_max_ms {
        return Err(ConfigError::Validation(format!(
            "backoff_base_ms ({}) cannot exceed backoff_max_ms ({})",
            config.backoff_base_ms, config.backoff_max_ms
        )));
    }

    Ok(())
}

/// Validates user agent, header and proxy settings
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if let Some(agent) = &config.user_agent {
        if agent.trim().is_empty() {
            return Err(ConfigError::Validation(
                "user_agent cannot be empty".to_string(),
            ));
        }
        HeaderValue::from_str(agent)
            .map_err(|e| ConfigError::InvalidHeader(format!("user_agent: {}", e)))?;
    }

    for agent in &config.user_agents {
        HeaderValue::from_str(agent)
            .map_err(|e| ConfigError::InvalidHeader(format!("user_agents entry '{}': {}", agent, e)))?;
    }

    for (name, value) in &config.headers {
        HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ConfigError::InvalidHeader(format!("'{}': {}", name, e)))?;
        HeaderValue::from_str(value)
            .map_err(|e| ConfigError::InvalidHeader(format!("value of '{}': {}", name, e)))?;
    }

    if let Some(proxy) = &config.proxy {
        reqwest::Proxy::all(proxy.as_str())
            .map_err(|e| ConfigError::InvalidProxy(format!("'{}': {}", proxy, e)))?;
    }

    Ok(())
}

/// Validates output settings
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    config
        .default_format
        .parse::<StorageFormat>()
        .map_err(|e| ConfigError::Validation(format!("default_format: {}", e)))?;
    Ok(())
}
