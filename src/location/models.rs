// src/location/models.rs

use crate::config::FallbackLocationConfig;
use crate::error::LocationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const UNKNOWN_CITY: &str = "Unknown Location";

/// Where a location came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationSource {
    Geolocation,
    GeolocationWatch,
    Fallback,
}

/// Latitude/longitude rounded to four decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn rounded(lat: f64, lon: f64) -> Self {
        Self {
            lat: round4(lat),
            lon: round4(lon),
        }
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// A resolved, human-readable location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedLocation {
    pub city: String,
    pub state: String,
    pub country: String,
    pub full_address: String,
    pub coordinates: Coordinates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    /// When the underlying position fix was taken.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    pub source: LocationSource,
}

impl CachedLocation {
    pub fn is_fallback(&self) -> bool {
        self.source == LocationSource::Fallback
    }
}

impl From<&FallbackLocationConfig> for CachedLocation {
    fn from(config: &FallbackLocationConfig) -> Self {
        Self {
            city: config.city.clone(),
            state: config.state.clone(),
            country: config.country.clone(),
            full_address: config.full_address.clone(),
            coordinates: Coordinates::rounded(config.lat, config.lon),
            accuracy: None,
            timestamp: None,
            source: LocationSource::Fallback,
        }
    }
}

/// The persisted cache record. `timestamp` is unix milliseconds at caching time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedLocation {
    pub location: CachedLocation,
    pub timestamp: i64,
}

/// Place names returned by a reverse geocoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Place {
    pub city: String,
    pub state: String,
    pub country: String,
    pub full_address: String,
}

impl Place {
    /// Stand-in used when reverse geocoding fails.
    pub fn unknown(lat: f64, lon: f64) -> Self {
        Self {
            city: UNKNOWN_CITY.to_string(),
            state: String::new(),
            country: String::new(),
            full_address: format!("{}, {}", lat, lon),
        }
    }
}

/// A raw position fix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest previously obtained fix the source may hand back.
    pub maximum_age: Duration,
}

impl PositionOptions {
    pub const SINGLE: Self = Self {
        high_accuracy: true,
        timeout: Duration::from_secs(10),
        maximum_age: Duration::from_secs(5 * 60),
    };

    pub const WATCH: Self = Self {
        high_accuracy: true,
        timeout: Duration::from_secs(15),
        maximum_age: Duration::from_secs(2 * 60),
    };
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self::SINGLE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    Granted,
    Denied,
    Prompt,
    Unsupported,
}

/// User-facing progress and status messages emitted by the location manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LocationNotice {
    UsingCached { city: String },
    Locating,
    ResolvingCity,
    Found { city: String },
    Failed { reason: String },
    CacheCleared,
}

impl LocationNotice {
    pub fn message(&self) -> String {
        match self {
            Self::UsingCached { city } => format!("Using cached location: {}", city),
            Self::Locating => "Getting your location...".to_string(),
            Self::ResolvingCity => "Looking up your city...".to_string(),
            Self::Found { city } => format!("Location found: {}", city),
            Self::Failed { reason } => reason.clone(),
            Self::CacheCleared => "Location cache cleared".to_string(),
        }
    }
}

/// Result of `get_location`: always a location, plus the error that forced a fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationOutcome {
    pub location: CachedLocation,
    pub error: Option<LocationError>,
}

impl LocationOutcome {
    pub fn is_fallback(&self) -> bool {
        self.location.is_fallback()
    }
}
