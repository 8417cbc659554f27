// src/state.rs

use crate::config::{load_config, AppConfig, PositionSourceConfig};
use crate::dispatch::{
    CredentialSet, Dispatcher, DispatcherState, GenerativeEndpoint, ServiceEndpoint,
    WeatherEndpoint,
};
use crate::error::{AppError, Result};
use crate::location::{
    FixedPositionSource, IpPositionSource, LocationManager, LocationSettings, NominatimGeocoder,
    PositionSource,
};
use crate::services::{GenerativeClient, WeatherAssistant, WeatherClient};
use crate::storage::{FileStore, InMemoryStore, KeyValueStore};
use reqwest::{Client, ClientBuilder};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Everything a host needs, built once from configuration.
///
/// Rotation pointers live in the dispatchers held here, so they persist for as long as the
/// host keeps this value.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub weather: WeatherClient,
    pub generative: GenerativeClient,
    pub assistant: WeatherAssistant,
    pub location: LocationManager,
}

fn build_client(total_key_count: usize) -> Result<Client> {
    let configure_builder = |builder: ClientBuilder| -> ClientBuilder {
        builder
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(total_key_count.max(4))
            .tcp_keepalive(Some(Duration::from_secs(60)))
    };

    configure_builder(Client::builder())
        .build()
        .map_err(|e| AppError::HttpClient {
            message: format!("Failed to build HTTP client: {}", e),
            status_code: None,
        })
}

fn build_dispatcher(
    client: &Client,
    keys: &[String],
    endpoint: Arc<dyn ServiceEndpoint>,
    timeout_secs: u64,
    config: &AppConfig,
) -> Result<Dispatcher> {
    let credentials = CredentialSet::new(keys.iter().cloned())?;
    let state = Arc::new(DispatcherState::new(credentials.len()));
    info!(
        service = %endpoint.name(),
        keys = credentials.len(),
        timeout_secs,
        "Dispatcher initialized"
    );
    Ok(Dispatcher::new(
        client.clone(),
        credentials,
        state,
        endpoint,
        Duration::from_secs(timeout_secs),
    )?
    .with_policy(config.rotation.invalid_key_policy))
}

impl AppState {
    /// Loads, validates and wires the configuration at `config_path`.
    pub fn load(config_path: &Path) -> Result<Self> {
        let config = load_config(config_path)?;
        Self::new(&config)
    }

    /// Builds the state with the location store named by the configuration.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let store: Arc<dyn KeyValueStore> = match &config.location.store_path {
            Some(path) => {
                info!(path = %path.display(), "Using file-backed location store");
                Arc::new(FileStore::new(path))
            }
            None => Arc::new(InMemoryStore::new()),
        };
        Self::with_store(config, store)
    }

    pub fn with_store(config: &AppConfig, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        info!("Creating shared AppState: initializing dispatchers and location manager...");
        let client = build_client(config.weather.api_keys.len() + config.generative.api_keys.len())?;

        let weather = WeatherClient::new(build_dispatcher(
            &client,
            &config.weather.api_keys,
            Arc::new(WeatherEndpoint::new(&config.weather.base_url)?),
            config.weather.timeout_secs,
            config,
        )?);

        let generative_endpoint =
            GenerativeEndpoint::new(&config.generative.base_url, &config.generative.model)?;
        let generative = GenerativeClient::new(
            build_dispatcher(
                &client,
                &config.generative.api_keys,
                Arc::new(generative_endpoint),
                config.generative.timeout_secs,
                config,
            )?,
            &config.generative.model,
        );

        let source: Arc<dyn PositionSource> = match &config.location.source {
            PositionSourceConfig::None => Arc::new(FixedPositionSource::unavailable()),
            PositionSourceConfig::Fixed { lat, lon, accuracy } => {
                Arc::new(FixedPositionSource::new(*lat, *lon, *accuracy))
            }
            PositionSourceConfig::Ip { url } => {
                Arc::new(IpPositionSource::new(client.clone(), url.clone()))
            }
        };
        let geocoder = NominatimGeocoder::new(
            client,
            &config.geocoder.base_url,
            config.geocoder.user_agent.clone(),
            Duration::from_secs(config.geocoder.timeout_secs),
        )?;
        let location = LocationManager::new(
            store,
            source,
            Arc::new(geocoder),
            LocationSettings::from(&config.location),
        );

        Ok(Self {
            config: Arc::new(config.clone()),
            assistant: WeatherAssistant::new(weather.clone(), generative.clone()),
            weather,
            generative,
            location,
        })
    }
}
