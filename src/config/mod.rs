// src/config/mod.rs

pub mod app;
pub mod loader;
pub mod validation;

pub use app::{
    AppConfig, FallbackLocationConfig, GenerativeServiceConfig, GeocoderConfig,
    InvalidKeyPolicy, LocationConfig, PositionSourceConfig, RotationConfig, WeatherServiceConfig,
};
pub use loader::{load_config, save_config};
pub use validation::ConfigValidator;
