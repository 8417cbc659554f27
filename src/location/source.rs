// src/location/source.rs

use crate::error::LocationError;
use crate::location::{PermissionState, Position, PositionOptions};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Device positioning, abstracted as an async source of position fixes.
#[async_trait]
pub trait PositionSource: Send + Sync {
    /// Obtains one position fix. The caller enforces `options.timeout` as well.
    async fn current_position(&self, options: &PositionOptions)
        -> Result<Position, LocationError>;

    async fn permission(&self) -> PermissionState;

    fn is_supported(&self) -> bool {
        true
    }

    /// How often `watch` polls this source.
    fn watch_interval(&self) -> Duration {
        Duration::from_secs(30)
    }
}

/// A position taken from configuration. Without one, the source is unsupported.
#[derive(Debug, Clone, Default)]
pub struct FixedPositionSource {
    fix: Option<(f64, f64, Option<f64>)>,
    interval: Option<Duration>,
}

impl FixedPositionSource {
    pub fn new(lat: f64, lon: f64, accuracy: Option<f64>) -> Self {
        Self {
            fix: Some((lat, lon, accuracy)),
            interval: None,
        }
    }

    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn with_watch_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }
}

#[async_trait]
impl PositionSource for FixedPositionSource {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Position, LocationError> {
        let (latitude, longitude, accuracy) = self.fix.ok_or(LocationError::Unsupported)?;
        Ok(Position {
            latitude,
            longitude,
            accuracy,
            timestamp: Utc::now(),
        })
    }

    async fn permission(&self) -> PermissionState {
        if self.fix.is_some() {
            PermissionState::Granted
        } else {
            PermissionState::Unsupported
        }
    }

    fn is_supported(&self) -> bool {
        self.fix.is_some()
    }

    fn watch_interval(&self) -> Duration {
        self.interval.unwrap_or(Duration::from_secs(30))
    }
}

#[derive(Debug, Deserialize)]
struct IpLookup {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(alias = "latitude")]
    lat: Option<f64>,
    #[serde(alias = "longitude")]
    lon: Option<f64>,
}

/// Approximate position from an IP geolocation endpoint (ip-api.com style).
///
/// Reuses its last fix while that fix is younger than the requested `maximum_age`.
#[derive(Debug)]
pub struct IpPositionSource {
    client: Client,
    url: String,
    last: Mutex<Option<Position>>,
}

/// City-level accuracy reported for IP fixes, in metres.
const IP_ACCURACY_METERS: f64 = 5_000.0;

impl IpPositionSource {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            last: Mutex::new(None),
        }
    }

    fn reusable_fix(&self, maximum_age: Duration) -> Option<Position> {
        let last = self.last.lock();
        let fix = last.as_ref()?;
        let age = (Utc::now() - fix.timestamp).to_std().ok()?;
        (age <= maximum_age).then(|| fix.clone())
    }
}

#[async_trait]
impl PositionSource for IpPositionSource {
    async fn current_position(
        &self,
        options: &PositionOptions,
    ) -> Result<Position, LocationError> {
        if let Some(fix) = self.reusable_fix(options.maximum_age) {
            debug!("Reusing recent IP position fix");
            return Ok(fix);
        }

        let response = self
            .client
            .get(&self.url)
            .timeout(options.timeout)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "IP geolocation request failed");
                if e.is_timeout() {
                    LocationError::Timeout
                } else {
                    LocationError::PositionUnavailable
                }
            })?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "IP geolocation endpoint returned an error");
            return Err(LocationError::PositionUnavailable);
        }

        let lookup: IpLookup = response.json().await.map_err(|e| {
            warn!(error = %e, "IP geolocation body could not be decoded");
            LocationError::PositionUnavailable
        })?;

        if lookup.status.as_deref() == Some("fail") {
            warn!(message = ?lookup.message, "IP geolocation lookup failed");
            return Err(LocationError::PositionUnavailable);
        }

        let (Some(latitude), Some(longitude)) = (lookup.lat, lookup.lon) else {
            return Err(LocationError::PositionUnavailable);
        };

        let fix = Position {
            latitude,
            longitude,
            accuracy: Some(IP_ACCURACY_METERS),
            timestamp: Utc::now(),
        };
        *self.last.lock() = Some(fix.clone());
        Ok(fix)
    }

    async fn permission(&self) -> PermissionState {
        PermissionState::Granted
    }
}
