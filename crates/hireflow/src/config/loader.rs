use std::path::Path;

use crate::config::schema::{Config, MAX_CHANNEL_CAPACITY, MAX_LIVE_WINDOW_SECS};
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../../../schema/config-v1.json");

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    // Compiles the automated stage pattern
    config.automation.rule()?;

    let threshold = config.automation.pass_threshold;
    if !(0.0..=100.0).contains(&threshold) {
        return Err(ConfigError::Validation {
            message: format!("passThreshold must be within 0-100, got {}", threshold),
        });
    }

    let relay = &config.relay;
    if !(1..=MAX_LIVE_WINDOW_SECS).contains(&relay.live_window_secs) {
        return Err(ConfigError::Validation {
            message: format!(
                "liveWindowSecs must be within 1-{}, got {}",
                MAX_LIVE_WINDOW_SECS, relay.live_window_secs
            ),
        });
    }
    if !(1..=MAX_CHANNEL_CAPACITY).contains(&relay.channel_capacity) {
        return Err(ConfigError::Validation {
            message: format!(
                "channelCapacity must be within 1-{}, got {}",
                MAX_CHANNEL_CAPACITY, relay.channel_capacity
            ),
        });
    }

    Ok(())
}
