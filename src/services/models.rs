// src/services/models.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result of a weather call that may have been served from synthetic data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub body: Value,
    /// True when `body` is synthetic because the service could not be reached.
    pub degraded: bool,
}

/// Generated text, or rule-based text when the generative service is unavailable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Insight {
    pub(crate) fn generated(text: String, model: &str) -> Self {
        Self {
            text,
            model: Some(model.to_string()),
            degraded: false,
            error: None,
        }
    }

    pub(crate) fn degraded(text: String, error: impl ToString) -> Self {
        Self {
            text,
            model: None,
            degraded: true,
            error: Some(error.to_string()),
        }
    }
}

/// Current conditions at one place, as fed to the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location: String,
    pub temperature_c: f64,
    pub humidity: f64,
    pub wind_kph: f64,
    pub conditions: String,
}

impl WeatherSnapshot {
    /// Reads a snapshot out of a `current.json` body. Numeric fields may be numbers or strings.
    pub fn from_current(body: &Value) -> Option<Self> {
        Some(Self {
            location: body.pointer("/location/name")?.as_str()?.to_string(),
            temperature_c: number(body.pointer("/current/temp_c")?)?,
            humidity: number(body.pointer("/current/humidity")?)?,
            wind_kph: number(body.pointer("/current/wind_kph")?)?,
            conditions: body
                .pointer("/current/condition/text")
                .and_then(Value::as_str)
                .unwrap_or("Unknown")
                .to_string(),
        })
    }
}

/// One row of a city comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityConditions {
    pub name: String,
    pub temperature_c: f64,
    pub conditions: String,
}

/// Accepts both JSON numbers and numeric strings such as `"20.000"`.
pub fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
