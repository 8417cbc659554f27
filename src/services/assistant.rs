// src/services/assistant.rs

use crate::services::weather::clamp_days;
use crate::services::{fallback, CityConditions, GenerativeClient, Insight, WeatherClient, WeatherSnapshot};
use tracing::{instrument, warn};

/// AI commentary on weather data, degrading to rule-based text.
#[derive(Debug, Clone)]
pub struct WeatherAssistant {
    weather: WeatherClient,
    generative: GenerativeClient,
}

fn analysis_prompt(s: &WeatherSnapshot) -> String {
    format!(
        "Analyze the following weather data and provide insights:\n\n\
         Location: {}\nTemperature: {}°C\nHumidity: {}%\nWind Speed: {} km/h\nConditions: {}\n\n\
         Please provide:\n\
         1. A brief weather summary\n\
         2. Recommendations for outdoor activities\n\
         3. Any weather warnings or precautions\n\
         4. 24-hour forecast prediction\n\n\
         Keep the response concise and practical.",
        s.location, s.temperature_c, s.humidity, s.wind_kph, s.conditions
    )
}

fn prediction_prompt(location: &str, days: u32) -> String {
    format!(
        "Generate a {days}-day weather forecast for {location}.\n\n\
         Please provide:\n\
         1. Daily temperature ranges (min/max)\n\
         2. Precipitation probability\n\
         3. General weather conditions\n\
         4. Any notable weather patterns\n\n\
         Format the response as a structured prediction for each day."
    )
}

fn recommendations_prompt(s: &WeatherSnapshot) -> String {
    format!(
        "Based on the current weather conditions:\n\n\
         Temperature: {}°C\nHumidity: {}%\nWind: {} km/h\nConditions: {}\n\n\
         Provide practical recommendations for:\n\
         1. Clothing suggestions\n\
         2. Travel advisories\n\
         3. Health precautions\n\
         4. Best times for outdoor activities\n\n\
         Keep recommendations brief and actionable.",
        s.temperature_c, s.humidity, s.wind_kph, s.conditions
    )
}

fn comparison_prompt(cities: &[CityConditions]) -> String {
    let rows: Vec<String> = cities
        .iter()
        .map(|c| format!("{}: {}°C, {}", c.name, c.temperature_c, c.conditions))
        .collect();
    format!(
        "Compare the weather conditions between these cities:\n\n{}\n\n\
         Provide:\n\
         1. Which city has the best weather today\n\
         2. Key differences in weather patterns\n\
         3. Travel recommendations based on weather\n\n\
         Keep the comparison concise and helpful.",
        rows.join("\n")
    )
}

impl WeatherAssistant {
    pub fn new(weather: WeatherClient, generative: GenerativeClient) -> Self {
        Self { weather, generative }
    }

    pub fn weather(&self) -> &WeatherClient {
        &self.weather
    }

    pub fn generative(&self) -> &GenerativeClient {
        &self.generative
    }

    async fn ask(&self, prompt: String) -> crate::error::Result<Insight> {
        let text = self.generative.generate(&prompt).await?;
        Ok(Insight::generated(text, self.generative.model()))
    }

    #[instrument(level = "debug", skip(self, snapshot), fields(location = %snapshot.location))]
    pub async fn analysis(&self, snapshot: &WeatherSnapshot) -> Insight {
        match self.ask(analysis_prompt(snapshot)).await {
            Ok(insight) => insight,
            Err(e) => {
                warn!(error = %e, "Weather analysis degraded to rule-based text");
                Insight::degraded(fallback::analysis(snapshot), e)
            }
        }
    }

    /// A multi-day outlook. When generation fails, real forecast data is summarised instead.
    #[instrument(level = "debug", skip(self))]
    pub async fn prediction(&self, location: &str, days: u32) -> Insight {
        let error = match self.ask(prediction_prompt(location, days)).await {
            Ok(insight) => return insight,
            Err(e) => e,
        };
        warn!(error = %error, "Prediction degraded, trying forecast data");

        let text = match self.weather.forecast(location, clamp_days(days)).await {
            Ok(body) => fallback::forecast_prediction(location, days, &body),
            Err(e) => {
                warn!(error = %e, "Forecast data unavailable for degraded prediction");
                None
            }
        };

        Insight::degraded(
            text.unwrap_or_else(|| fallback::basic_prediction(location, days)),
            error,
        )
    }

    #[instrument(level = "debug", skip(self, snapshot), fields(location = %snapshot.location))]
    pub async fn recommendations(&self, snapshot: &WeatherSnapshot) -> Insight {
        match self.ask(recommendations_prompt(snapshot)).await {
            Ok(insight) => insight,
            Err(e) => {
                warn!(error = %e, "Recommendations degraded to rule-based text");
                Insight::degraded(fallback::recommendations(snapshot), e)
            }
        }
    }

    #[instrument(level = "debug", skip(self, cities), fields(cities = cities.len()))]
    pub async fn compare_cities(&self, cities: &[CityConditions]) -> Insight {
        match self.ask(comparison_prompt(cities)).await {
            Ok(insight) => insight,
            Err(e) => {
                warn!(error = %e, "City comparison unavailable");
                Insight::degraded(fallback::COMPARISON_UNAVAILABLE.to_string(), e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_prompt_lists_cities() {
        let prompt = comparison_prompt(&[
            CityConditions {
                name: "Shimla".to_string(),
                temperature_c: 12.0,
                conditions: "Fog".to_string(),
            },
            CityConditions {
                name: "Goa".to_string(),
                temperature_c: 31.5,
                conditions: "Sunny".to_string(),
            },
        ]);
        assert!(prompt.contains("Shimla: 12°C, Fog\nGoa: 31.5°C, Sunny"));
    }

    #[test]
    fn test_prediction_prompt() {
        assert!(prediction_prompt("Agra", 5).starts_with("Generate a 5-day weather forecast for Agra."));
    }
}
