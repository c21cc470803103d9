use crate::config::types::{Config, CrawlerConfig, OutputConfig, TargetConfig};
use crate::{ConfigError, ConfigResult};

/// Shortest timeout accepted for connects, reads and probes
const MIN_TIMEOUT_MS: u64 = 100;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_target_config(&config.target)?;
    validate_crawler_config(&config.crawler)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the crawl target
fn validate_target_config(config: &TargetConfig) -> ConfigResult<()> {
    if config.host.trim().is_empty() {
        return Err(ConfigError::Validation(
            "target host cannot be empty".to_string(),
        ));
    }

    if config.host.chars().any(|c| c.is_whitespace()) {
        return Err(ConfigError::Validation(format!(
            "target host must not contain whitespace, got '{}'",
            config.host
        )));
    }

    if config.port == 0 {
        return Err(ConfigError::Validation(
            "target port must be between 1 and 65535, got 0".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> ConfigResult<()> {
    for (name, value) in [
        ("connect_timeout_ms", config.connect_timeout_ms),
        ("read_timeout_ms", config.read_timeout_ms),
        ("probe_timeout_ms", config.probe_timeout_ms),
    ] {
        if value < MIN_TIMEOUT_MS {
            return Err(ConfigError::Validation(format!(
                "{} must be >= {}ms, got {}ms",
                name, MIN_TIMEOUT_MS, value
            )));
        }
    }

    if config.max_response_bytes < 1 {
        return Err(ConfigError::Validation(format!(
            "max_response_bytes must be >= 1, got {}",
            config.max_response_bytes
        )));
    }

    if config.probe_workers < 1 || config.probe_workers > 256 {
        return Err(ConfigError::Validation(format!(
            "probe_workers must be between 1 and 256, got {}",
            config.probe_workers
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> ConfigResult<()> {
    if config.summary_path.is_empty() {
        return Err(ConfigError::Validation(
            "summary_path cannot be empty".to_string(),
        ));
    }

    if matches!(&config.log_path, Some(path) if path.is_empty()) {
        return Err(ConfigError::Validation(
            "log_path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}
