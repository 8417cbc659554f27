// src/location/geocode.rs

use crate::error::{LocationError, Result};
use crate::location::{Place, UNKNOWN_CITY};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse(&self, lat: f64, lon: f64) -> std::result::Result<Place, LocationError>;
}

#[derive(Debug, Default, Deserialize)]
struct Address {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    county: Option<String>,
    state_district: Option<String>,
    state: Option<String>,
    region: Option<String>,
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: Option<Address>,
    #[serde(default)]
    display_name: Option<String>,
}

impl From<ReverseResponse> for Place {
    fn from(response: ReverseResponse) -> Self {
        let address = response.address.unwrap_or_default();
        let city = [
            address.city,
            address.town,
            address.village,
            address.municipality,
            address.county,
            address.state_district,
        ]
        .into_iter()
        .flatten()
        .find(|name| !name.is_empty())
        .unwrap_or_else(|| UNKNOWN_CITY.to_string());
        let state = address.state.or(address.region).unwrap_or_default();
        let country = address.country.unwrap_or_default();
        let full_address = response
            .display_name
            .unwrap_or_else(|| format!("{}, {}, {}", city, state, country));

        Place {
            city,
            state,
            country,
            full_address,
        }
    }
}

/// Reverse geocoding through an OpenStreetMap Nominatim instance.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: Client,
    base_url: Url,
    user_agent: String,
    timeout: Duration,
}

impl NominatimGeocoder {
    pub fn new(
        client: Client,
        base_url: &str,
        user_agent: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
            user_agent: user_agent.into(),
            timeout,
        })
    }

    fn reverse_url(&self, lat: f64, lon: f64) -> std::result::Result<Url, LocationError> {
        let joined = format!("{}/reverse", self.base_url.as_str().trim_end_matches('/'));
        let mut url =
            Url::parse(&joined).map_err(|e| LocationError::GeocodeFailed(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("format", "json")
            .append_pair("lat", &lat.to_string())
            .append_pair("lon", &lon.to_string())
            .append_pair("zoom", "10")
            .append_pair("addressdetails", "1");
        Ok(url)
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    async fn reverse(&self, lat: f64, lon: f64) -> std::result::Result<Place, LocationError> {
        let url = self.reverse_url(lat, lon)?;
        debug!(%url, "Reverse geocoding position");

        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| LocationError::GeocodeFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LocationError::GeocodeFailed(format!(
                "geocoder returned status {}",
                response.status()
            )));
        }

        let body: ReverseResponse = response
            .json()
            .await
            .map_err(|e| LocationError::GeocodeFailed(e.to_string()))?;
        Ok(body.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn place(value: serde_json::Value) -> Place {
        serde_json::from_value::<ReverseResponse>(value).unwrap().into()
    }

    #[test]
    fn test_city_chain_prefers_town_over_county() {
        let p = place(json!({
            "address": { "town": "Lonavala", "county": "Pune", "region": "Western", "country": "India" }
        }));
        assert_eq!(p.city, "Lonavala");
        assert_eq!(p.state, "Western");
        assert_eq!(p.full_address, "Lonavala, Western, India");
    }

    #[test]
    fn test_missing_address_is_unknown_location() {
        let p = place(json!({ "display_name": "Middle of the ocean" }));
        assert_eq!(p.city, "Unknown Location");
        assert_eq!(p.state, "");
        assert_eq!(p.full_address, "Middle of the ocean");
    }

    #[test]
    fn test_reverse_url() {
        let geocoder = NominatimGeocoder::new(
            Client::new(),
            "https://nominatim.openstreetmap.org/",
            "test-agent",
            Duration::from_secs(5),
        )
        .unwrap();
        let url = geocoder.reverse_url(19.076, 72.8777).unwrap();
        assert_eq!(
            url.as_str(),
            "https://nominatim.openstreetmap.org/reverse?format=json&lat=19.076&lon=72.8777&zoom=10&addressdetails=1"
        );
    }
}
