// src/lib.rs

//! Resilient multi-key dispatch for weather and generative-AI APIs, plus a cached
//! geolocation layer, for use by a weather dashboard host.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod location;
pub mod logging;
pub mod services;
pub mod state;
pub mod storage;

pub use config::AppConfig;
pub use dispatch::{CredentialSet, Dispatcher, DispatcherState, InvalidKeyPolicy, Params};
pub use error::{AppError, ExhaustedError, FailureKind, LocationError, Result, ServiceFailure};
pub use location::{CachedLocation, LocationManager, LocationOutcome};
pub use services::{GenerativeClient, WeatherAssistant, WeatherClient};
pub use state::AppState;
