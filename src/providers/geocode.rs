use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::{fetch_json, GeocodeProvider, GeocodedAddress, ProviderError};
use crate::config::Config;

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    formatted_address: String,
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Coordinates,
}

#[derive(Debug, Deserialize)]
struct Coordinates {
    lat: f64,
    lng: f64,
}

pub struct GeocodingClient {
    client: Client,
    config: Config,
}

impl GeocodingClient {
    pub fn new(config: Config) -> Self {
        let client = Client::builder()
            .user_agent("CityExplorer/1.0")
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }
}

#[async_trait]
impl GeocodeProvider for GeocodingClient {
    async fn geocode(&self, query: &str) -> Result<GeocodedAddress, ProviderError> {
        let url = format!("{}/maps/api/geocode/json", self.config.geocoding_base_url);
        let request = self.client.get(&url).query(&[
            ("address", query),
            ("key", self.config.geocoding_api_key.as_str()),
        ]);

        let json = fetch_json(request).await?;
        let response: GeocodeResponse = serde_json::from_value(json)?;

        let first = response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::ApiError(format!("no geocoding results for '{}'", query)))?;

        Ok(GeocodedAddress {
            formatted_address: first.formatted_address,
            latitude: first.geometry.location.lat,
            longitude: first.geometry.location.lng,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_result() {
        let json = serde_json::json!({
            "results": [
                {
                    "formatted_address": "Seattle, WA, USA",
                    "geometry": { "location": { "lat": 47.6062, "lng": -122.3321 } }
                },
                {
                    "formatted_address": "Seattle, Ward County, ND, USA",
                    "geometry": { "location": { "lat": 48.0, "lng": -102.0 } }
                }
            ]
        });

        let response: GeocodeResponse = serde_json::from_value(json).unwrap();
        let first = response.results.into_iter().next().unwrap();

        assert_eq!(first.formatted_address, "Seattle, WA, USA");
        assert_eq!(first.geometry.location.lat, 47.6062);
        assert_eq!(first.geometry.location.lng, -122.3321);
    }
}
