// src/location/manager.rs

use crate::config::LocationConfig;
use crate::error::{LocationError, Result};
use crate::location::{
    CachedLocation, Coordinates, LocationNotice, LocationOutcome, LocationSource, Notifier,
    PermissionState, PersistedLocation, Place, Position, PositionOptions, PositionSource,
    ReverseGeocoder, TracingNotifier,
};
use crate::storage::KeyValueStore;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Cache settings of a `LocationManager`.
#[derive(Debug, Clone)]
pub struct LocationSettings {
    pub cache_key: String,
    /// Entries strictly younger than this are served from the cache.
    pub freshness: Duration,
    /// Storage expiry of the persisted record.
    pub persistence: Duration,
    pub fallback: CachedLocation,
}

impl Default for LocationSettings {
    fn default() -> Self {
        Self::from(&LocationConfig::default())
    }
}

impl From<&LocationConfig> for LocationSettings {
    fn from(config: &LocationConfig) -> Self {
        Self {
            cache_key: config.cache_key.clone(),
            freshness: Duration::from_secs(config.freshness_minutes.saturating_mul(60)),
            persistence: Duration::from_secs(config.persistence_days.saturating_mul(24 * 60 * 60)),
            fallback: CachedLocation::from(&config.fallback),
        }
    }
}

/// Best-effort current location with a persisted, time-bounded cache.
///
/// Cloning is cheap and clones share the cache and notice de-duplication.
#[derive(Clone)]
pub struct LocationManager {
    store: Arc<dyn KeyValueStore>,
    source: Arc<dyn PositionSource>,
    geocoder: Arc<dyn ReverseGeocoder>,
    notifier: Arc<dyn Notifier>,
    settings: Arc<LocationSettings>,
    announced: Arc<Mutex<HashSet<String>>>,
}

/// Handle to a running `watch` subscription. Dropping it leaves the watch running, so the
/// handle is the only way to stop it.
#[must_use = "dropping a WatchHandle leaves the watch running with no way to cancel it"]
#[derive(Debug)]
pub struct WatchHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl WatchHandle {
    fn inactive() -> Self {
        let token = CancellationToken::new();
        token.cancel();
        Self { token, task: None }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
            && self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Waits for the watch task to stop. Only returns after `cancel`.
    pub async fn stopped(mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Location watch task ended abnormally");
            }
        }
    }
}

impl LocationManager {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        source: Arc<dyn PositionSource>,
        geocoder: Arc<dyn ReverseGeocoder>,
        settings: LocationSettings,
    ) -> Self {
        Self {
            store,
            source,
            geocoder,
            notifier: Arc::new(TracingNotifier),
            settings: Arc::new(settings),
            announced: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn settings(&self) -> &LocationSettings {
        &self.settings
    }

    /// Returns the cached location while fresh, otherwise a new fix or the fallback.
    ///
    /// Never fails: when no position is available the fallback location is returned together
    /// with the reason.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_location(&self, prompt_user: bool) -> LocationOutcome {
        if let Some(location) = self.fresh_cached().await {
            debug!(city = %location.city, "Serving cached location");
            if prompt_user {
                self.announce_cached(&location.city);
            }
            return LocationOutcome {
                location,
                error: None,
            };
        }

        if prompt_user {
            self.notifier.notify(LocationNotice::Locating);
        }

        match self
            .resolve(&PositionOptions::SINGLE, LocationSource::Geolocation, prompt_user)
            .await
        {
            Ok(location) => {
                info!(city = %location.city, "Location resolved");
                if prompt_user {
                    self.notifier.notify(LocationNotice::Found {
                        city: location.city.clone(),
                    });
                }
                LocationOutcome {
                    location,
                    error: None,
                }
            }
            Err(error) => {
                warn!(error = %error, "Falling back to default location");
                if prompt_user {
                    self.notifier.notify(LocationNotice::Failed {
                        reason: error.to_string(),
                    });
                }
                LocationOutcome {
                    location: self.settings.fallback.clone(),
                    error: Some(error),
                }
            }
        }
    }

    /// Polls the position source until cancelled, delivering each resolved fix.
    ///
    /// Each fix is also persisted to the cache. Must be called within a Tokio runtime.
    pub fn watch<F>(&self, mut callback: F) -> WatchHandle
    where
        F: FnMut(std::result::Result<CachedLocation, LocationError>) + Send + 'static,
    {
        if !self.source.is_supported() {
            callback(Err(LocationError::Unsupported));
            return WatchHandle::inactive();
        }

        let token = CancellationToken::new();
        let cancelled = token.clone();
        let manager = self.clone();
        let period = self.source.watch_interval();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(interval = ?period, "Location watch started");

            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {
                        let result = manager
                            .resolve(&PositionOptions::WATCH, LocationSource::GeolocationWatch, false)
                            .await;
                        if cancelled.is_cancelled() {
                            break;
                        }
                        callback(result);
                    }
                }
            }
            info!("Location watch stopped");
        });

        WatchHandle {
            token,
            task: Some(task),
        }
    }

    /// Deletes the persisted record and resets notice de-duplication.
    #[instrument(level = "debug", skip(self))]
    pub async fn clear_cache(&self) -> Result<()> {
        self.announced.lock().clear();
        self.store.delete(&self.settings.cache_key).await?;
        self.notifier.notify(LocationNotice::CacheCleared);
        Ok(())
    }

    pub async fn permission(&self) -> PermissionState {
        if !self.source.is_supported() {
            return PermissionState::Unsupported;
        }
        self.source.permission().await
    }

    /// Asks for one fix purely to trigger or observe the permission decision.
    pub async fn request_permission(&self) -> std::result::Result<Position, LocationError> {
        self.locate(&PositionOptions::SINGLE).await
    }

    /// The cached location if it is still fresh. Never touches the position source.
    pub async fn cached_location(&self) -> Option<CachedLocation> {
        self.fresh_cached().await
    }

    fn announce_cached(&self, city: &str) {
        let first_time = self.announced.lock().insert(city.to_string());
        if first_time {
            self.notifier.notify(LocationNotice::UsingCached {
                city: city.to_string(),
            });
        }
    }

    async fn fresh_cached(&self) -> Option<CachedLocation> {
        let key = &self.settings.cache_key;
        let value = match self.store.get(key).await {
            Ok(Some(value)) => value,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Location store read failed, treating as a miss");
                return None;
            }
        };

        let record: PersistedLocation = match serde_json::from_value(value) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Discarding unreadable location record");
                self.forget().await;
                return None;
            }
        };

        let age_ms = Utc::now().timestamp_millis() - record.timestamp;
        let freshness_ms = i64::try_from(self.settings.freshness.as_millis()).unwrap_or(i64::MAX);
        if age_ms < freshness_ms {
            Some(record.location)
        } else {
            debug!(age_ms, "Cached location is stale, deleting");
            self.forget().await;
            None
        }
    }

    async fn forget(&self) {
        if let Err(e) = self.store.delete(&self.settings.cache_key).await {
            warn!(error = %e, "Failed to delete location record");
        }
    }

    async fn locate(
        &self,
        options: &PositionOptions,
    ) -> std::result::Result<Position, LocationError> {
        if !self.source.is_supported() {
            return Err(LocationError::Unsupported);
        }
        tokio::time::timeout(options.timeout, self.source.current_position(options))
            .await
            .map_err(|_| LocationError::Timeout)?
    }

    async fn resolve(
        &self,
        options: &PositionOptions,
        source: LocationSource,
        prompt_user: bool,
    ) -> std::result::Result<CachedLocation, LocationError> {
        let position = self.locate(options).await?;

        if prompt_user {
            self.notifier.notify(LocationNotice::ResolvingCity);
        }

        let place = match self
            .geocoder
            .reverse(position.latitude, position.longitude)
            .await
        {
            Ok(place) => place,
            Err(e) => {
                warn!(error = %e, "Reverse geocoding failed, using coordinates only");
                Place::unknown(position.latitude, position.longitude)
            }
        };

        let location = CachedLocation {
            city: place.city,
            state: place.state,
            country: place.country,
            full_address: place.full_address,
            coordinates: Coordinates::rounded(position.latitude, position.longitude),
            accuracy: position.accuracy,
            timestamp: Some(position.timestamp),
            source,
        };

        self.persist(&location).await;
        Ok(location)
    }

    async fn persist(&self, location: &CachedLocation) {
        let record = PersistedLocation {
            location: location.clone(),
            timestamp: Utc::now().timestamp_millis(),
        };
        let value = match serde_json::to_value(&record) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Failed to serialize location record");
                return;
            }
        };
        if let Err(e) = self
            .store
            .set(&self.settings.cache_key, value, Some(self.settings.persistence))
            .await
        {
            warn!(error = %e, "Failed to persist location");
        }
    }
}
