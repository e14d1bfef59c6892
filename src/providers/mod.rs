use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::database::{CreateBusiness, CreateMovie, CreateWeather};

pub mod business;
pub mod forecast;
pub mod geocode;
pub mod mock;
pub mod movie;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("JSON parsing failed: {0}")]
    JsonParsing(#[from] serde_json::Error),
    #[error("API error: {0}")]
    ApiError(String),
}

#[derive(Debug, Clone)]
pub struct GeocodedAddress {
    pub formatted_address: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[async_trait]
pub trait GeocodeProvider: Send + Sync {
    async fn geocode(&self, query: &str) -> Result<GeocodedAddress, ProviderError>;
}

#[async_trait]
pub trait ForecastProvider: Send + Sync {
    async fn daily_forecast(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<CreateWeather>, ProviderError>;
}

#[async_trait]
pub trait BusinessProvider: Send + Sync {
    async fn search(&self, search_text: &str) -> Result<Vec<CreateBusiness>, ProviderError>;
}

#[async_trait]
pub trait MovieProvider: Send + Sync {
    async fn search(&self, search_text: &str) -> Result<Vec<CreateMovie>, ProviderError>;
}

// No retries here: a failed upstream call surfaces immediately and the
// next request re-attempts the same path.
pub(crate) async fn fetch_json(request: reqwest::RequestBuilder) -> Result<Value, ProviderError> {
    let response = request.send().await?;
    let status = response.status();

    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(ProviderError::ApiError(format!(
            "HTTP {}: {}",
            status, error_text
        )));
    }

    let json: Value = response.json().await?;
    Ok(json)
}
