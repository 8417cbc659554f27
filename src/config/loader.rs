// src/config/loader.rs

use crate::config::{AppConfig, ConfigValidator};
use crate::error::{AppError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Load configuration from file, then apply environment overrides and validate.
pub fn load_config(config_path: &Path) -> Result<AppConfig> {
    let mut config = if config_path.exists() {
        info!("Loading configuration from file: {}", config_path.display());
        load_from_file(config_path)?
    } else {
        info!("Configuration file not found, using defaults");
        AppConfig::default()
    };

    override_with_env(&mut config);

    ConfigValidator::validate(&config)?;

    debug!("Configuration loaded and validated successfully");
    Ok(config)
}

fn load_from_file(config_path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(config_path).map_err(|_| AppError::ConfigNotFound {
        path: config_path.display().to_string(),
    })?;

    serde_yaml::from_str(&content).map_err(|e| AppError::ConfigParse {
        message: format!("Failed to parse config file: {}", e),
        line: e.location().map(|loc| loc.line()),
    })
}

fn split_keys(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

fn override_with_env(config: &mut AppConfig) {
    if let Ok(keys) = std::env::var("WEATHER_API_KEYS") {
        let keys = split_keys(&keys);
        info!(count = keys.len(), "Overriding weather API keys from environment variable");
        config.weather.api_keys = keys;
    }

    if let Ok(keys) = std::env::var("GEMINI_API_KEYS") {
        let keys = split_keys(&keys);
        info!(count = keys.len(), "Overriding generative API keys from environment variable");
        config.generative.api_keys = keys;
    }

    if let Ok(url) = std::env::var("WEATHER_API_URL") {
        info!("Overriding weather base URL from environment variable: {}", url);
        config.weather.base_url = url;
    }

    if let Ok(url) = std::env::var("GEMINI_API_URL") {
        info!("Overriding generative base URL from environment variable: {}", url);
        config.generative.base_url = url;
    }

    if let Ok(model) = std::env::var("GEMINI_MODEL") {
        info!("Overriding generative model from environment variable: {}", model);
        config.generative.model = model;
    }

    if let Ok(path) = std::env::var("LOCATION_STORE_PATH") {
        info!("Overriding location store path from environment variable: {}", path);
        config.location.store_path = Some(PathBuf::from(path));
    }

    if let Ok(policy) = std::env::var("INVALID_KEY_POLICY") {
        match policy.parse() {
            Ok(policy) => {
                info!(?policy, "Overriding invalid key policy from environment variable");
                config.rotation.invalid_key_policy = policy;
            }
            Err(e) => warn!("Invalid INVALID_KEY_POLICY environment variable: {}", e),
        }
    }
}

/// Save configuration to file.
pub async fn save_config(config: &AppConfig, config_path: &Path) -> Result<()> {
    let yaml_content = serde_yaml::to_string(config).map_err(|e| AppError::Serialization {
        message: format!("Failed to serialize config: {}", e),
    })?;

    tokio::fs::write(config_path, yaml_content)
        .await
        .map_err(|e| AppError::Io {
            operation: "write_config".to_string(),
            message: format!("Failed to write config file: {}", e),
        })?;

    info!("Configuration saved to: {}", config_path.display());
    Ok(())
}
