use crate::config::types::{Config, DynamicConfig, ParserConfig};
use crate::ConfigError;
use encoding_rs::Encoding;
use url::Url;

/// Longest wait for dynamic content that a config may ask for
pub const MAX_WAIT_SECONDS_LIMIT: u64 = 3600;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_parser_config(&config.parser)?;
    validate_dynamic_config(&config.dynamic)?;
    Ok(())
}

/// Validates static extraction settings
fn validate_parser_config(config: &ParserConfig) -> Result<(), ConfigError> {
    if config.max_outgoing_links_to_follow < 1 {
        return Err(ConfigError::Validation(format!(
            "max_outgoing_links_to_follow must be >= 1, got {}",
            config.max_outgoing_links_to_follow
        )));
    }

    if Encoding::for_label(config.default_charset.trim().as_bytes()).is_none() {
        return Err(ConfigError::Validation(format!(
            "default_charset '{}' is not a known encoding",
            config.default_charset
        )));
    }

    Ok(())
}

/// Validates dynamic extraction settings
fn validate_dynamic_config(config: &DynamicConfig) -> Result<(), ConfigError> {
    if config.max_wait_for_dynamic_content_seconds < 1 {
        return Err(ConfigError::Validation(
            "max_wait_for_dynamic_content_seconds must be >= 1".to_string(),
        ));
    }

    if config.max_wait_for_dynamic_content_seconds > MAX_WAIT_SECONDS_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max_wait_for_dynamic_content_seconds must be <= {}, got {}",
            MAX_WAIT_SECONDS_LIMIT, config.max_wait_for_dynamic_content_seconds
        )));
    }

    if config.max_download_size < 1 {
        return Err(ConfigError::Validation(
            "max_download_size must be >= 1".to_string(),
        ));
    }

    let endpoint = Url::parse(&config.webdriver_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid webdriver_url: {}", e)))?;
    if endpoint.scheme() != "http" && endpoint.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "webdriver_url must use http or https, got '{}'",
            config.webdriver_url
        )));
    }

    if let Some(path) = &config.webdriver_path {
        if !path.exists() {
            return Err(ConfigError::Validation(format!(
                "Headless browser driver not found at {}",
                path.display()
            )));
        }
    }

    for flag in &config.render_engine_launch_flags {
        validate_launch_flag(flag)?;
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Launch flags must look like `-x`, `--key` or `--key=value`
fn validate_launch_flag(flag: &str) -> Result<(), ConfigError> {
    let trimmed = flag.trim();
    if !trimmed.starts_with('-') || trimmed.trim_start_matches('-').is_empty() {
        return Err(ConfigError::Validation(format!(
            "render engine launch flag must start with '-', got '{}'",
            flag
        )));
    }
    Ok(())
}
