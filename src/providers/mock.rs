use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{
    BusinessProvider, ForecastProvider, GeocodeProvider, GeocodedAddress, MovieProvider,
    ProviderError,
};
use crate::database::{CreateBusiness, CreateMovie, CreateWeather};

// Deterministic stand-ins for the upstream providers, with call counters
// so tests can assert whether the cache actually short-circuited a fetch.

pub struct MockGeocoder {
    pub calls: AtomicUsize,
}

impl MockGeocoder {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl GeocodeProvider for MockGeocoder {
    async fn geocode(&self, query: &str) -> Result<GeocodedAddress, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        Ok(GeocodedAddress {
            formatted_address: format!("{}, USA", query),
            latitude: 47.6062,
            longitude: -122.3321,
        })
    }
}

pub struct MockForecast {
    pub calls: AtomicUsize,
}

impl MockForecast {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ForecastProvider for MockForecast {
    async fn daily_forecast(
        &self,
        _latitude: f64,
        _longitude: f64,
    ) -> Result<Vec<CreateWeather>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        Ok(vec![
            CreateWeather {
                forecast: "Clear throughout the day.".to_string(),
                time: NaiveDate::from_ymd_opt(2025, 8, 6).unwrap(),
            },
            CreateWeather {
                forecast: "Light rain in the morning.".to_string(),
                time: NaiveDate::from_ymd_opt(2025, 8, 7).unwrap(),
            },
            CreateWeather {
                forecast: "Partly cloudy until evening.".to_string(),
                time: NaiveDate::from_ymd_opt(2025, 8, 8).unwrap(),
            },
        ])
    }
}

pub struct MockBusinessSearch {
    pub calls: AtomicUsize,
}

impl MockBusinessSearch {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl BusinessProvider for MockBusinessSearch {
    async fn search(&self, _search_text: &str) -> Result<Vec<CreateBusiness>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        Ok(vec![
            CreateBusiness {
                name: "Pike Place Chowder".to_string(),
                image_url: Some("https://example.com/chowder.jpg".to_string()),
                price: Some("$$".to_string()),
                rating: Some(4.5),
                url: "https://yelp.example.com/pike-place-chowder".to_string(),
            },
            CreateBusiness {
                name: "The Pink Door".to_string(),
                image_url: None,
                price: Some("$$$".to_string()),
                rating: Some(4.0),
                url: "https://yelp.example.com/the-pink-door".to_string(),
            },
        ])
    }
}

pub struct MockMovieSearch {
    pub calls: AtomicUsize,
    fail: bool,
}

impl MockMovieSearch {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    /// A provider that is down: every search returns an API error.
    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }
}

#[async_trait]
impl MovieProvider for MockMovieSearch {
    async fn search(&self, _search_text: &str) -> Result<Vec<CreateMovie>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail {
            return Err(ProviderError::ApiError(
                "HTTP 503 Service Unavailable: upstream is down".to_string(),
            ));
        }

        Ok(vec![CreateMovie {
            title: "Sleepless in Seattle".to_string(),
            overview: Some("A widower's son calls a radio show.".to_string()),
            average_votes: 6.7,
            total_votes: 1500,
            image_url: Some("https://image.tmdb.org/t/p/w500/sleepless.jpg".to_string()),
            popularity: 18.4,
            released_on: Some("1993-06-25".to_string()),
        }])
    }
}
