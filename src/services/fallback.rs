// src/services/fallback.rs

//! Rule-based text served when the generative service is unavailable.

use crate::services::models::{number, WeatherSnapshot};
use chrono::NaiveDate;
use serde_json::Value;
use std::fmt::Write;

pub const COMPARISON_UNAVAILABLE: &str = "Unable to generate comparison at this time.";

fn bullets(out: &mut String, heading: &str, lines: &[&str]) {
    if lines.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{}", heading);
    for line in lines {
        let _ = writeln!(out, "- {}", line);
    }
}

pub fn analysis(snapshot: &WeatherSnapshot) -> String {
    let mut out = format!("Weather Analysis for {}\n", snapshot.location);
    let _ = writeln!(out, "\nCurrent Conditions:");
    let _ = writeln!(out, "- Temperature: {}°C", snapshot.temperature_c);
    let _ = writeln!(out, "- Humidity: {}%", snapshot.humidity);
    let _ = writeln!(out, "- Wind Speed: {} km/h", snapshot.wind_kph);
    let _ = writeln!(out, "- Conditions: {}", snapshot.conditions);
    let _ = writeln!(
        out,
        "\nNote: AI-powered analysis is temporarily unavailable. This is basic weather data."
    );

    let mut advice = Vec::new();
    if snapshot.temperature_c > 30.0 {
        advice.push("Stay hydrated and avoid prolonged sun exposure");
    }
    if snapshot.temperature_c < 15.0 {
        advice.push("Dress warmly and layer your clothing");
    }
    if snapshot.humidity > 70.0 {
        advice.push("High humidity - may feel warmer than actual temperature");
    }
    if snapshot.wind_kph > 30.0 {
        advice.push("Strong winds - secure loose objects outdoors");
    }
    bullets(&mut out, "Recommendations:", &advice);

    out.push_str("\nPlease try again later for AI-powered insights.");
    out
}

pub fn recommendations(snapshot: &WeatherSnapshot) -> String {
    let temp = snapshot.temperature_c;
    let hot = temp > 30.0;
    let mild = (20.0..=30.0).contains(&temp);
    let cool = temp < 20.0;

    let mut out = String::from("Weather Recommendations\n");

    let mut clothing = Vec::new();
    if hot {
        clothing.extend(["Light, breathable clothing", "Sun hat and sunglasses"]);
    }
    if mild {
        clothing.extend(["Comfortable casual wear", "Light jacket for evening"]);
    }
    if cool {
        clothing.extend(["Warm layers", "Jacket or sweater"]);
    }
    bullets(&mut out, "Clothing Suggestions:", &clothing);

    let travel: &[&str] = if snapshot.wind_kph > 40.0 {
        &["Strong winds - drive carefully", "Secure loose items"]
    } else {
        &["Normal travel conditions", "Standard precautions apply"]
    };
    bullets(&mut out, "Travel Advisories:", travel);

    let mut health = Vec::new();
    if hot {
        health.extend(["Stay hydrated - drink plenty of water", "Use sunscreen (SPF 30+)"]);
    }
    if snapshot.humidity > 70.0 {
        health.extend(["High humidity - may feel warmer", "Monitor for heat exhaustion"]);
    }
    if temp < 15.0 {
        health.extend(["Protect against cold", "Keep extremities warm"]);
    }
    bullets(&mut out, "Health Precautions:", &health);

    let timing: &[&str] = if hot {
        &["Early morning (6-9 AM)", "Late evening (after 6 PM)", "Avoid midday heat"]
    } else if mild {
        &["Anytime during daylight", "Morning and evening are most pleasant"]
    } else {
        &["Midday when warmest", "Consider indoor alternatives"]
    };
    bullets(&mut out, "Best Times for Outdoor Activities:", timing);

    out.push_str(
        "\nNote: AI-powered recommendations are temporarily unavailable. \
         These are basic guidelines based on current conditions.",
    );
    out
}

fn text_at<'a>(value: &'a Value, pointer: &str) -> &'a str {
    value.pointer(pointer).and_then(Value::as_str).unwrap_or("-")
}

fn num_text(value: &Value, pointer: &str) -> String {
    value
        .pointer(pointer)
        .and_then(number)
        .map(|n| format!("{:.1}", n))
        .unwrap_or_else(|| "-".to_string())
}

/// Builds a day-by-day forecast text from a `forecast.json` body.
///
/// Returns `None` when the body has no forecast days.
pub fn forecast_prediction(location: &str, days: u32, body: &Value) -> Option<String> {
    let forecast_days = body.pointer("/forecast/forecastday")?.as_array()?;
    if forecast_days.is_empty() {
        return None;
    }

    let mut out = format!("{}-Day Weather Forecast for {}\n\n", days, location);
    let _ = writeln!(
        out,
        "Location: {}, {}",
        text_at(body, "/location/name"),
        text_at(body, "/location/region")
    );
    let _ = writeln!(
        out,
        "Note: AI predictions unavailable. Showing real forecast data.\n"
    );

    for (i, day) in forecast_days.iter().enumerate() {
        let label = day
            .get("date")
            .and_then(Value::as_str)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .map(|d| d.format("%A, %b %-d").to_string())
            .unwrap_or_else(|| text_at(day, "/date").to_string());

        let _ = writeln!(out, "Day {}: {}", i + 1, label);
        let _ = writeln!(
            out,
            "  Temperature: {}°C - {}°C (Avg: {}°C)",
            num_text(day, "/day/mintemp_c"),
            num_text(day, "/day/maxtemp_c"),
            num_text(day, "/day/avgtemp_c")
        );
        let _ = writeln!(out, "  Conditions: {}", text_at(day, "/day/condition/text"));
        let _ = writeln!(
            out,
            "  Precipitation: {}mm ({}% chance of rain)",
            num_text(day, "/day/totalprecip_mm"),
            num_text(day, "/day/daily_chance_of_rain")
        );
        let _ = writeln!(out, "  Wind: {} km/h", num_text(day, "/day/maxwind_kph"));
        let _ = writeln!(out, "  Humidity: {}%\n", num_text(day, "/day/avghumidity"));
    }

    let temps: Vec<f64> = forecast_days
        .iter()
        .filter_map(|d| d.pointer("/day/avgtemp_c").and_then(number))
        .collect();
    let rain: f64 = forecast_days
        .iter()
        .filter_map(|d| d.pointer("/day/totalprecip_mm").and_then(number))
        .sum();

    let _ = writeln!(out, "Summary:");
    if !temps.is_empty() {
        let avg = temps.iter().sum::<f64>() / temps.len() as f64;
        let _ = writeln!(out, "- Average Temperature: {:.1}°C", avg);
    }
    let _ = writeln!(out, "- Total Precipitation: {:.1}mm", rain);
    if let (Some(first), Some(last)) = (forecast_days.first(), forecast_days.last()) {
        let _ = write!(
            out,
            "- Conditions vary from {} to {}",
            text_at(first, "/day/condition/text"),
            text_at(last, "/day/condition/text")
        );
    }

    Some(out)
}

/// Guidance used when neither the generative nor the weather service is reachable.
pub fn basic_prediction(location: &str, days: u32) -> String {
    format!(
        "{days}-Day Weather Prediction for {location}\n\n\
         AI predictions and forecast data are temporarily unavailable.\n\n\
         Tips:\n\
         - Weather patterns typically remain stable for 2-3 days\n\
         - Check humidity levels for rain probability\n\
         - Monitor wind speeds for outdoor activity planning\n\
         - Temperature variations are usually gradual\n\n\
         Please try again later for a detailed {days}-day forecast."
    )
}
