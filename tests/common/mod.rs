//! Common test utilities and fixtures

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use weather_dispatch::{
    config::AppConfig,
    dispatch::{CredentialSet, Dispatcher, DispatcherState, GenerativeEndpoint, WeatherEndpoint},
    error::LocationError,
    location::{
        CachedLocation, Coordinates, LocationManager, LocationNotice, LocationSettings,
        LocationSource, Notifier, PermissionState, PersistedLocation, Place, Position,
        PositionOptions, PositionSource, ReverseGeocoder,
    },
    storage::{InMemoryStore, KeyValueStore},
};

pub const MODEL: &str = "gemini-pro";

/// Test configuration builder
pub struct TestConfigBuilder {
    config: AppConfig,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    pub fn with_weather_key(mut self, key: impl Into<String>) -> Self {
        self.config.weather.api_keys.push(key.into());
        self
    }

    pub fn with_generative_key(mut self, key: impl Into<String>) -> Self {
        self.config.generative.api_keys.push(key.into());
        self
    }

    /// Points every upstream at one mock server.
    pub fn with_server(mut self, uri: &str) -> Self {
        self.config.weather.base_url = format!("{}/v1", uri);
        self.config.generative.base_url = format!("{}/v1beta", uri);
        self.config.geocoder.base_url = uri.to_string();
        self
    }

    pub fn with_fixed_position(mut self, lat: f64, lon: f64) -> Self {
        self.config.location.source =
            weather_dispatch::config::PositionSourceConfig::Fixed { lat, lon, accuracy: None };
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn weather_dispatcher(uri: &str, keys: &[&str]) -> Dispatcher {
    let credentials = CredentialSet::new(keys.iter().copied()).unwrap();
    let state = Arc::new(DispatcherState::new(credentials.len()));
    let endpoint = Arc::new(WeatherEndpoint::new(&format!("{}/v1", uri)).unwrap());
    Dispatcher::new(
        reqwest::Client::new(),
        credentials,
        state,
        endpoint,
        Duration::from_secs(5),
    )
    .unwrap()
}

pub fn generative_dispatcher(uri: &str, keys: &[&str]) -> Dispatcher {
    let credentials = CredentialSet::new(keys.iter().copied()).unwrap();
    let state = Arc::new(DispatcherState::new(credentials.len()));
    let endpoint = Arc::new(GenerativeEndpoint::new(&format!("{}/v1beta", uri), MODEL).unwrap());
    Dispatcher::new(
        reqwest::Client::new(),
        credentials,
        state,
        endpoint,
        Duration::from_secs(5),
    )
    .unwrap()
}

pub const GENERATE_PATH: &str = "/v1beta/models/gemini-pro:generateContent";

pub fn completion(text: &str) -> Value {
    json!({ "candidates": [{ "content": { "parts": [{ "text": text }], "role": "model" } }] })
}

pub fn current_body(city: &str, temp_c: f64, humidity: f64, wind_kph: f64) -> Value {
    json!({
        "location": { "name": city, "region": "", "country": "India" },
        "current": {
            "temp_c": temp_c, "humidity": humidity, "wind_kph": wind_kph,
            "condition": { "text": "Clear" }
        }
    })
}

/// Collects notices for later inspection.
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<LocationNotice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<LocationNotice> {
        self.notices.lock().clone()
    }

    pub fn count_cached(&self) -> usize {
        self.notices
            .lock()
            .iter()
            .filter(|n| matches!(n, LocationNotice::UsingCached { .. }))
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: LocationNotice) {
        self.notices.lock().push(notice);
    }
}

/// Position source with a scripted outcome that counts how often it is asked.
pub struct ScriptedSource {
    outcome: Result<(f64, f64), LocationError>,
    delay: Option<Duration>,
    interval: Duration,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn at(lat: f64, lon: f64) -> Self {
        Self {
            outcome: Ok((lat, lon)),
            delay: None,
            interval: Duration::from_millis(20),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: LocationError) -> Self {
        Self {
            outcome: Err(error),
            ..Self::at(0.0, 0.0)
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PositionSource for ScriptedSource {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Position, LocationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let (latitude, longitude) = self.outcome.clone()?;
        Ok(Position {
            latitude,
            longitude,
            accuracy: Some(15.0),
            timestamp: Utc::now(),
        })
    }

    async fn permission(&self) -> PermissionState {
        match self.outcome {
            Err(LocationError::PermissionDenied) => PermissionState::Denied,
            _ => PermissionState::Granted,
        }
    }

    fn watch_interval(&self) -> Duration {
        self.interval
    }
}

/// Geocoder answering with a fixed city, or failing.
pub struct StaticGeocoder {
    pub city: Option<&'static str>,
}

#[async_trait]
impl ReverseGeocoder for StaticGeocoder {
    async fn reverse(&self, _lat: f64, _lon: f64) -> Result<Place, LocationError> {
        match self.city {
            Some(city) => Ok(Place {
                city: city.to_string(),
                state: "Karnataka".to_string(),
                country: "India".to_string(),
                full_address: format!("{}, Karnataka, India", city),
            }),
            None => Err(LocationError::GeocodeFailed("offline".to_string())),
        }
    }
}

pub struct LocationFixture {
    pub store: Arc<InMemoryStore>,
    pub source: Arc<ScriptedSource>,
    pub notifier: Arc<RecordingNotifier>,
    pub manager: LocationManager,
}

pub fn location_fixture(source: ScriptedSource, city: Option<&'static str>) -> LocationFixture {
    let store = Arc::new(InMemoryStore::new());
    let source = Arc::new(source);
    let notifier = Arc::new(RecordingNotifier::default());
    let manager = LocationManager::new(
        store.clone(),
        source.clone(),
        Arc::new(StaticGeocoder { city }),
        LocationSettings::default(),
    )
    .with_notifier(notifier.clone());

    LocationFixture {
        store,
        source,
        notifier,
        manager,
    }
}

pub fn sample_location(city: &str) -> CachedLocation {
    CachedLocation {
        city: city.to_string(),
        state: "Karnataka".to_string(),
        country: "India".to_string(),
        full_address: format!("{}, Karnataka, India", city),
        coordinates: Coordinates::rounded(12.9716, 77.5946),
        accuracy: Some(10.0),
        timestamp: Some(Utc::now()),
        source: LocationSource::Geolocation,
    }
}

/// Writes a cache record that is `age` old under the default cache key.
pub async fn seed_location(store: &dyn KeyValueStore, city: &str, age: chrono::Duration) {
    let record = PersistedLocation {
        location: sample_location(city),
        timestamp: (Utc::now() - age).timestamp_millis(),
    };
    store
        .set(
            &LocationSettings::default().cache_key,
            serde_json::to_value(record).unwrap(),
            Some(Duration::from_secs(7 * 24 * 60 * 60)),
        )
        .await
        .unwrap();
}

/// A manager over `store` with the default settings, and the source it polls.
pub fn location_fixture_with_store(
    store: Arc<dyn KeyValueStore>,
    source: ScriptedSource,
    city: Option<&'static str>,
) -> (LocationManager, Arc<ScriptedSource>) {
    let source = Arc::new(source);
    let manager = LocationManager::new(
        store,
        source.clone(),
        Arc::new(StaticGeocoder { city }),
        LocationSettings::default(),
    );
    (manager, source)
}
