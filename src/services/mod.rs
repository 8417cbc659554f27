//! Weather and generative-AI operations with degraded fallbacks.

pub mod assistant;
pub mod fallback;
pub mod generative;
pub mod mock;
pub mod models;
pub mod weather;

pub use assistant::WeatherAssistant;
pub use generative::GenerativeClient;
pub use models::{CityConditions, Insight, Report, WeatherSnapshot};
pub use weather::{WeatherClient, MAX_FORECAST_DAYS};
