use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::{fetch_json, ForecastProvider, ProviderError};
use crate::config::Config;
use crate::database::CreateWeather;

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    daily: DailyBlock,
}

#[derive(Debug, Deserialize)]
struct DailyBlock {
    data: Vec<DailyEntry>,
}

#[derive(Debug, Deserialize)]
struct DailyEntry {
    time: i64,
    summary: String,
}

pub struct ForecastClient {
    client: Client,
    config: Config,
}

impl ForecastClient {
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
impl ForecastProvider for ForecastClient {
    async fn daily_forecast(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<CreateWeather>, ProviderError> {
        let url = format!(
            "{}/forecast/{}/{},{}",
            self.config.weather_base_url, self.config.weather_api_key, latitude, longitude
        );

        let json = fetch_json(self.client.get(&url)).await?;
        let response: ForecastResponse = serde_json::from_value(json)?;

        normalize(response)
    }
}

// The provider reports each day as a unix timestamp; only the calendar
// date is kept, formatting happens in the response layer.
fn normalize(response: ForecastResponse) -> Result<Vec<CreateWeather>, ProviderError> {
    response
        .daily
        .data
        .into_iter()
        .map(|day| {
            let time = DateTime::from_timestamp(day.time, 0)
                .ok_or_else(|| {
                    ProviderError::ApiError(format!("invalid forecast timestamp {}", day.time))
                })?
                .date_naive();

            Ok(CreateWeather {
                forecast: day.summary,
                time,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn normalizes_daily_entries_to_calendar_dates() {
        let json = serde_json::json!({
            "daily": {
                "data": [
                    { "time": 1754438400, "summary": "Clear throughout the day." },
                    { "time": 1754524800, "summary": "Light rain in the morning." }
                ]
            }
        });

        let response: ForecastResponse = serde_json::from_value(json).unwrap();
        let records = normalize(response).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].forecast, "Clear throughout the day.");
        assert_eq!(records[0].time, NaiveDate::from_ymd_opt(2025, 8, 6).unwrap());
        assert_eq!(records[1].time, NaiveDate::from_ymd_opt(2025, 8, 7).unwrap());
    }
}
