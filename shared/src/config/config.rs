use std::fs;
use tracing::{debug, error, info};

use crate::types::server_config::{AppConfig, ConfigError, MAX_DELAY_MS};

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    info!("Loading configuration from: {}", path);

    let contents = fs::read_to_string(path)?;
    debug!("Processing file: {}", path);

    if contents.trim().is_empty() {
        error!("Configuration file is empty");
        return Err(ConfigError::InvalidConfig("empty file".into()));
    }

    let config = parse_config(&contents)?;

    info!("Configuration loaded successfully");
    Ok(config)
}

/// Parse and validate a TOML document. Missing sections fall back to defaults.
pub fn parse_config(contents: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = toml::from_str(contents)?;
    debug!("Config: {:?}", config);

    validate_config(&config)?;
    info!("Config validated");

    Ok(config)
}

pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.bind.trim().is_empty() {
        return Err(ConfigError::InvalidConfig("bind cannot be empty".into()));
    }

    if config.stream.messages.is_empty() {
        return Err(ConfigError::InvalidConfig(
            "stream.messages must contain at least one message".into(),
        ));
    }

    if config.stream.delay_ms > MAX_DELAY_MS {
        return Err(ConfigError::InvalidConfig(format!(
            "stream.delay_ms must be at most {}",
            MAX_DELAY_MS
        )));
    }

    Ok(())
}
