// src/services/weather.rs

use crate::dispatch::{Dispatcher, KeyProbeReport, Params};
use crate::error::{AppError, Result};
use crate::services::{mock, Report};
use chrono::NaiveDate;
use serde_json::Value;
use tracing::{instrument, warn};

/// The weather service accepts at most this many forecast days.
pub const MAX_FORECAST_DAYS: u32 = 10;

/// Weather operations on top of a rotating dispatcher.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    dispatcher: Dispatcher,
}

fn query_params(query: &str) -> Result<Params> {
    let query = query.trim();
    if query.is_empty() {
        return Err(AppError::validation("q", "location query cannot be empty"));
    }
    let mut params = Params::new();
    params.insert("q".to_string(), query.to_string());
    Ok(params)
}

pub fn clamp_days(days: u32) -> u32 {
    days.clamp(1, MAX_FORECAST_DAYS)
}

impl WeatherClient {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Current conditions with air quality.
    #[instrument(level = "debug", skip(self))]
    pub async fn current(&self, query: &str) -> Result<Value> {
        let mut params = query_params(query)?;
        params.insert("aqi".to_string(), "yes".to_string());
        Ok(self.dispatcher.dispatch("current", &params).await?)
    }

    /// Daily forecast for `days` days (clamped to 1..=10) with air quality and alerts.
    #[instrument(level = "debug", skip(self))]
    pub async fn forecast(&self, query: &str, days: u32) -> Result<Value> {
        let mut params = query_params(query)?;
        params.insert("days".to_string(), clamp_days(days).to_string());
        params.insert("aqi".to_string(), "yes".to_string());
        params.insert("alerts".to_string(), "yes".to_string());
        Ok(self.dispatcher.dispatch("forecast", &params).await?)
    }

    /// Observed weather on `date`. There is no synthetic fallback for history.
    #[instrument(level = "debug", skip(self))]
    pub async fn history(&self, query: &str, date: NaiveDate) -> Result<Value> {
        let mut params = query_params(query)?;
        params.insert("dt".to_string(), date.format("%Y-%m-%d").to_string());
        Ok(self.dispatcher.dispatch("history", &params).await?)
    }

    pub async fn current_or_mock(&self, query: &str) -> Report {
        match self.current(query).await {
            Ok(body) => Report {
                body,
                degraded: false,
            },
            Err(e) => {
                warn!(error = %e, error.code = e.error_code(), query, "Serving synthetic current weather");
                Report {
                    body: mock::current(&mut rand::thread_rng(), query),
                    degraded: true,
                }
            }
        }
    }

    pub async fn forecast_or_mock(&self, query: &str, days: u32) -> Report {
        match self.forecast(query, days).await {
            Ok(body) => Report {
                body,
                degraded: false,
            },
            Err(e) => {
                warn!(error = %e, error.code = e.error_code(), query, days, "Serving synthetic forecast");
                Report {
                    body: mock::forecast(&mut rand::thread_rng(), query, clamp_days(days)),
                    degraded: true,
                }
            }
        }
    }

    pub async fn probe_keys(&self) -> KeyProbeReport {
        self.dispatcher.probe_keys().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_days() {
        assert_eq!(clamp_days(0), 1);
        assert_eq!(clamp_days(7), 7);
        assert_eq!(clamp_days(14), 10);
    }

    #[test]
    fn test_blank_query_rejected() {
        assert!(query_params("  ").is_err());
        assert_eq!(query_params(" Goa ").unwrap()["q"], "Goa");
    }
}
