// src/config/validation.rs

use crate::config::{AppConfig, PositionSourceConfig};
use crate::dispatch::preview_key;
use crate::error::{AppError, Result};
use std::collections::HashSet;
use tracing::{debug, warn};
use url::Url;

/// Upper bound of `location.freshness_minutes` (one week).
pub const MAX_FRESHNESS_MINUTES: u64 = 7 * 24 * 60;
/// Upper bound of `location.persistence_days` (ten years).
pub const MAX_PERSISTENCE_DAYS: u64 = 3650;

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &AppConfig) -> Result<()> {
        debug!("Starting configuration validation");

        if let Err(e) = Self::validate_services(config) {
            warn!("Service validation failed: {}", e);
            return Err(e);
        }
        debug!("Service validation passed");

        if let Err(e) = Self::validate_location(config) {
            warn!("Location config validation failed: {}", e);
            return Err(e);
        }
        debug!("Location config validation passed");

        debug!("Configuration validation completed successfully");
        Ok(())
    }

    fn validate_services(config: &AppConfig) -> Result<()> {
        Self::validate_keys(&config.weather.api_keys, "weather.api_keys")?;
        Self::validate_keys(&config.generative.api_keys, "generative.api_keys")?;

        Self::validate_base_url(&config.weather.base_url, "weather.base_url")?;
        Self::validate_base_url(&config.generative.base_url, "generative.base_url")?;
        Self::validate_base_url(&config.geocoder.base_url, "geocoder.base_url")?;

        if config.generative.model.trim().is_empty() {
            return Err(AppError::config_validation(
                "Generative model name cannot be empty",
                Some("generative.model"),
            ));
        }

        for (timeout, field) in [
            (config.weather.timeout_secs, "weather.timeout_secs"),
            (config.generative.timeout_secs, "generative.timeout_secs"),
            (config.geocoder.timeout_secs, "geocoder.timeout_secs"),
        ] {
            if timeout == 0 {
                return Err(AppError::config_validation(
                    format!("Timeout cannot be 0 ({})", field),
                    Some(field),
                ));
            }
        }

        Ok(())
    }

    fn validate_keys(keys: &[String], field: &str) -> Result<()> {
        if keys.is_empty() {
            return Err(AppError::config_validation(
                "At least one API key must be configured",
                Some(field),
            ));
        }

        let mut seen = HashSet::new();
        for key in keys {
            if key.trim().is_empty() {
                return Err(AppError::config_validation(
                    "API keys cannot be blank",
                    Some(field),
                ));
            }
            if !seen.insert(key) {
                return Err(AppError::config_validation(
                    format!("Duplicate API key found: {}", preview_key(key)),
                    Some(field),
                ));
            }
        }

        debug!("Validated {} keys for {}", keys.len(), field);
        Ok(())
    }

    fn validate_location(config: &AppConfig) -> Result<()> {
        let location = &config.location;

        if location.cache_key.trim().is_empty() {
            return Err(AppError::config_validation(
                "Location cache key cannot be empty",
                Some("location.cache_key"),
            ));
        }

        if location.freshness_minutes == 0 {
            return Err(AppError::config_validation(
                "Freshness window cannot be 0",
                Some("location.freshness_minutes"),
            ));
        }

        if location.freshness_minutes > MAX_FRESHNESS_MINUTES {
            return Err(AppError::config_validation(
                format!(
                    "Freshness window cannot exceed {} minutes",
                    MAX_FRESHNESS_MINUTES
                ),
                Some("location.freshness_minutes"),
            ));
        }

        if location.persistence_days > MAX_PERSISTENCE_DAYS {
            return Err(AppError::config_validation(
                format!("Persistence cannot exceed {} days", MAX_PERSISTENCE_DAYS),
                Some("location.persistence_days"),
            ));
        }

        if location.persistence_days * 24 * 60 < location.freshness_minutes {
            warn!("Location persistence is shorter than its freshness window");
        }

        Self::validate_coordinates(
            location.fallback.lat,
            location.fallback.lon,
            "location.fallback",
        )?;

        match &location.source {
            PositionSourceConfig::None => {}
            PositionSourceConfig::Fixed { lat, lon, .. } => {
                Self::validate_coordinates(*lat, *lon, "location.source")?;
            }
            PositionSourceConfig::Ip { url } => {
                Self::validate_url(url, "location.source.url")?;
            }
        }

        Ok(())
    }

    fn validate_coordinates(lat: f64, lon: f64, field: &str) -> Result<()> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(AppError::config_validation(
                format!("Coordinates out of range: {}, {}", lat, lon),
                Some(field),
            ));
        }
        Ok(())
    }

    fn validate_url(url_str: &str, field_name: &str) -> Result<Url> {
        Url::parse(url_str).map_err(|e| {
            AppError::config_validation(
                format!("Invalid URL in {}: {} - {}", field_name, url_str, e),
                Some(field_name),
            )
        })
    }

    /// Base URLs get path segments and the `key` parameter appended, so they carry no query.
    fn validate_base_url(url_str: &str, field_name: &str) -> Result<()> {
        let url = Self::validate_url(url_str, field_name)?;

        match url.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(AppError::config_validation(
                    format!("Unsupported scheme '{}' in {}", scheme, field_name),
                    Some(field_name),
                ))
            }
        }

        if url.query().is_some() {
            return Err(AppError::config_validation(
                format!("Base URL must not carry a query string: {}", url_str),
                Some(field_name),
            ));
        }

        Ok(())
    }
}
