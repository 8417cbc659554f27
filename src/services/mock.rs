// src/services/mock.rs

//! Synthetic weather bodies with the same shape as the real endpoints.

use chrono::{Duration, Utc};
use rand::Rng;
use serde_json::{json, Value};

const PARTLY_CLOUDY_ICON: &str = "//cdn.weatherapi.com/weather/64x64/day/116.png";

fn fixed3(value: f64) -> String {
    format!("{:.3}", value)
}

fn around<R: Rng>(rng: &mut R, base: f64, spread: f64) -> String {
    fixed3(base + rng.gen::<f64>() * spread)
}

/// A plausible `current.json` body for `query`.
pub fn current<R: Rng>(rng: &mut R, query: &str) -> Value {
    let now = Utc::now();
    json!({
        "location": {
            "name": query,
            "region": "Mock Region",
            "country": "Mock Country",
            "localtime": now.format("%Y-%m-%d %H:%M").to_string(),
            "lat": fixed3(37.7749),
            "lon": fixed3(-122.4194),
        },
        "current": {
            "temp_c": around(rng, 22.0, 10.0),
            "temp_f": around(rng, 72.0, 18.0),
            "feelslike_c": around(rng, 24.0, 8.0),
            "feelslike_f": around(rng, 75.0, 14.0),
            "condition": { "text": "Partly cloudy", "code": 1003, "icon": PARTLY_CLOUDY_ICON },
            "humidity": around(rng, 60.0, 20.0),
            "precip_mm": around(rng, 0.0, 2.0),
            "precip_in": around(rng, 0.0, 0.08),
            "wind_kph": around(rng, 10.0, 15.0),
            "wind_mph": around(rng, 6.0, 9.0),
            "wind_dir": "SW",
            "wind_degree": fixed3(225.0),
            "gust_kph": around(rng, 15.0, 20.0),
            "vis_km": around(rng, 8.0, 4.0),
            "uv": around(rng, 0.0, 10.0),
            "pressure_mb": around(rng, 1010.0, 20.0),
            "cloud": around(rng, 0.0, 100.0),
            "dewpoint_c": around(rng, 15.0, 5.0),
            "last_updated": now.format("%Y-%m-%d %H:%M").to_string(),
            "last_updated_epoch": now.timestamp(),
            "is_day": 1,
            "air_quality": {
                "co": around(rng, 300.0, 200.0),
                "no2": around(rng, 20.0, 30.0),
                "o3": around(rng, 50.0, 50.0),
                "so2": around(rng, 10.0, 20.0),
                "pm2_5": around(rng, 10.0, 40.0),
                "pm10": around(rng, 20.0, 60.0),
                "us-epa-index": rng.gen_range(1..=6),
                "gb-defra-index": rng.gen_range(1..=10),
            },
        },
    })
}

/// A plausible `forecast.json` body with `days` daily entries starting today.
pub fn forecast<R: Rng>(rng: &mut R, query: &str, days: u32) -> Value {
    let today = Utc::now();
    let forecastday: Vec<Value> = (0..days)
        .map(|offset| {
            let date = today + Duration::days(i64::from(offset));
            json!({
                "date": date.format("%Y-%m-%d").to_string(),
                "date_epoch": date.timestamp(),
                "day": {
                    "maxtemp_c": around(rng, 20.0, 15.0),
                    "mintemp_c": around(rng, 10.0, 10.0),
                    "avgtemp_c": around(rng, 15.0, 12.0),
                    "maxwind_kph": around(rng, 10.0, 20.0),
                    "totalprecip_mm": around(rng, 0.0, 5.0),
                    "avghumidity": around(rng, 60.0, 20.0),
                    "daily_chance_of_rain": rng.gen_range(0..=100),
                    "uv": around(rng, 0.0, 8.0),
                    "condition": { "text": "Partly cloudy", "code": 1003, "icon": PARTLY_CLOUDY_ICON },
                },
            })
        })
        .collect();

    json!({
        "location": { "name": query, "region": "Mock Region", "country": "Mock Country" },
        "forecast": { "forecastday": forecastday },
        "alerts": { "alert": [] },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::models::number;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_current_mock_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let body = current(&mut rng, "Jaipur");
        assert_eq!(body["location"]["name"], "Jaipur");
        let temp = number(&body["current"]["temp_c"]).unwrap();
        assert!((22.0..=32.0).contains(&temp));
        let epa = body["current"]["air_quality"]["us-epa-index"].as_u64().unwrap();
        assert!((1..=6).contains(&epa));
    }

    #[test]
    fn test_forecast_mock_has_requested_days() {
        let mut rng = StdRng::seed_from_u64(1);
        let body = forecast(&mut rng, "Delhi", 4);
        let days = body["forecast"]["forecastday"].as_array().unwrap();
        assert_eq!(days.len(), 4);
        assert!(days[0]["day"]["condition"]["text"].is_string());
    }
}
