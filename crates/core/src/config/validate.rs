use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - HTTP timeout is not 0
/// - Base URLs are http(s)
/// - EZTV page size is within what the API accepts, and at least one page is allowed
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.http.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "http.timeout_secs cannot be 0".to_string(),
        ));
    }

    check_base_url("tpb.base_url", &config.tpb.base_url)?;
    check_base_url("eztv.base_url", &config.eztv.base_url)?;

    if !(1..=100).contains(&config.eztv.page_size) {
        return Err(ConfigError::ValidationError(format!(
            "eztv.page_size must be between 1 and 100, got {}",
            config.eztv.page_size
        )));
    }

    if config.eztv.max_pages == 0 {
        return Err(ConfigError::ValidationError(
            "eztv.max_pages cannot be 0".to_string(),
        ));
    }

    Ok(())
}

fn check_base_url(key: &str, url: &str) -> Result<(), ConfigError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(format!(
            "{} must be an http(s) URL, got '{}'",
            key, url
        )))
    }
}
