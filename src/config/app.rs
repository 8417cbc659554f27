// src/config/app.rs

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What the dispatcher does with a key that failed authentication.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum InvalidKeyPolicy {
    /// Every failure only advances the pointer; the key is tried again once rotation wraps.
    #[default]
    RetryOnRotation,
    /// An `AuthError` disables the key for the lifetime of its `DispatcherState`.
    SkipPermanently,
}

impl std::str::FromStr for InvalidKeyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "retry_on_rotation" | "retry" => Ok(Self::RetryOnRotation),
            "skip_permanently" | "skip" => Ok(Self::SkipPermanently),
            other => Err(format!("unknown invalid key policy '{other}'")),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Serialize)]
pub struct WeatherServiceConfig {
    #[serde(default = "default_weather_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_keys: Vec<String>,
    #[serde(default = "default_weather_timeout")]
    pub timeout_secs: u64,
}

impl Default for WeatherServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_url(),
            api_keys: Vec::new(),
            timeout_secs: default_weather_timeout(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Serialize)]
pub struct GenerativeServiceConfig {
    #[serde(default = "default_generative_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub api_keys: Vec<String>,
    #[serde(default = "default_generative_timeout")]
    pub timeout_secs: u64,
}

impl Default for GenerativeServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_generative_url(),
            model: default_model(),
            api_keys: Vec::new(),
            timeout_secs: default_generative_timeout(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Serialize, Default)]
pub struct RotationConfig {
    #[serde(default)]
    pub invalid_key_policy: InvalidKeyPolicy,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Serialize)]
pub struct GeocoderConfig {
    #[serde(default = "default_geocoder_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_geocoder_timeout")]
    pub timeout_secs: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoder_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_geocoder_timeout(),
        }
    }
}

/// Location substituted when no position can be obtained.
#[derive(Debug, Deserialize, Clone, PartialEq, Serialize)]
pub struct FallbackLocationConfig {
    pub city: String,
    pub state: String,
    pub country: String,
    pub full_address: String,
    pub lat: f64,
    pub lon: f64,
}

impl Default for FallbackLocationConfig {
    fn default() -> Self {
        Self {
            city: "Mumbai".to_string(),
            state: "Maharashtra".to_string(),
            country: "India".to_string(),
            full_address: "Mumbai, Maharashtra, India (Default)".to_string(),
            lat: 19.0760,
            lon: 72.8777,
        }
    }
}

/// Which position source backs the location manager.
#[derive(Debug, Deserialize, Clone, PartialEq, Serialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PositionSourceConfig {
    /// No positioning available; every request falls back.
    #[default]
    None,
    /// A fixed position, e.g. for kiosks or tests.
    Fixed {
        lat: f64,
        lon: f64,
        #[serde(default)]
        accuracy: Option<f64>,
    },
    /// Approximate position from an IP geolocation endpoint.
    Ip {
        #[serde(default = "default_ip_locator_url")]
        url: String,
    },
}

#[derive(Debug, Deserialize, Clone, PartialEq, Serialize)]
pub struct LocationConfig {
    #[serde(default = "default_cache_key")]
    pub cache_key: String,
    #[serde(default = "default_freshness_minutes")]
    pub freshness_minutes: u64,
    #[serde(default = "default_persistence_days")]
    pub persistence_days: u64,
    /// JSON file backing the location store; in-memory when absent.
    #[serde(default)]
    pub store_path: Option<PathBuf>,
    #[serde(default)]
    pub fallback: FallbackLocationConfig,
    #[serde(default)]
    pub source: PositionSourceConfig,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            cache_key: default_cache_key(),
            freshness_minutes: default_freshness_minutes(),
            persistence_days: default_persistence_days(),
            store_path: None,
            fallback: FallbackLocationConfig::default(),
            source: PositionSourceConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub weather: WeatherServiceConfig,
    #[serde(default)]
    pub generative: GenerativeServiceConfig,
    #[serde(default)]
    pub rotation: RotationConfig,
    #[serde(default)]
    pub geocoder: GeocoderConfig,
    #[serde(default)]
    pub location: LocationConfig,
}

// Default value functions
fn default_weather_url() -> String {
    "https://api.weatherapi.com/v1".to_string()
}

fn default_weather_timeout() -> u64 {
    10
}

fn default_generative_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_model() -> String {
    "gemini-pro".to_string()
}

fn default_generative_timeout() -> u64 {
    30
}

fn default_geocoder_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_user_agent() -> String {
    concat!("weather-dispatch/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_geocoder_timeout() -> u64 {
    10
}

fn default_ip_locator_url() -> String {
    "http://ip-api.com/json".to_string()
}

fn default_cache_key() -> String {
    "weather_app_location".to_string()
}

fn default_freshness_minutes() -> u64 {
    30
}

fn default_persistence_days() -> u64 {
    7
}
