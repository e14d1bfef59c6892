use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::cache::{CacheState, FreshnessCache};
use crate::database::{
    BusinessRecord, CreateBusiness, CreateMovie, CreateWeather, DatabaseError, Location,
    MovieRecord, WeatherRecord,
};
use crate::providers::{BusinessProvider, ForecastProvider, MovieProvider, ProviderError};
use crate::resolver::{LocationResolver, ResolveError};

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<LocationResolver>,
    pub cache: Arc<FreshnessCache>,
    pub forecast: Arc<dyn ForecastProvider>,
    pub businesses: Arc<dyn BusinessProvider>,
    pub movies: Arc<dyn MovieProvider>,
}

// Every failure collapses to the same 500; the detail only goes to the log.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("upstream fetch failed: {0}")]
    Upstream(#[from] ProviderError),
    #[error("store operation failed: {0}")]
    Store(#[from] DatabaseError),
    #[error("location resolution failed: {0}")]
    Resolve(#[from] ResolveError),
    #[error("malformed data parameter: {0}")]
    BadData(#[from] serde_json::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!("request failed: {}", self);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Sorry, something went terribly wrong.",
        )
            .into_response()
    }
}

// Request types. The cached endpoints carry their parameters as a
// JSON-encoded `data` query value.
#[derive(Debug, Deserialize)]
pub struct DataParam {
    pub data: String,
}

#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub search_query: String,
    pub id: i64,
}

// Response types
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct LocationResponse {
    pub id: i64,
    pub search_query: String,
    pub formatted_query: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<Location> for LocationResponse {
    fn from(location: Location) -> Self {
        Self {
            id: location.id,
            search_query: location.search_query,
            formatted_query: location.formatted_query,
            latitude: location.latitude,
            longitude: location.longitude,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ForecastDay {
    pub forecast: String,
    pub time: String,
}

impl ForecastDay {
    // Stored as a calendar date, rendered here in the day-name form the
    // API has always served.
    fn new(forecast: String, time: NaiveDate) -> Self {
        Self {
            forecast,
            time: time.format("%a %b %d %Y").to_string(),
        }
    }
}

impl From<WeatherRecord> for ForecastDay {
    fn from(record: WeatherRecord) -> Self {
        Self::new(record.forecast, record.time)
    }
}

impl From<CreateWeather> for ForecastDay {
    fn from(record: CreateWeather) -> Self {
        Self::new(record.forecast, record.time)
    }
}

#[derive(Debug, Serialize)]
pub struct BusinessSummary {
    pub name: String,
    pub image_url: Option<String>,
    pub price: Option<String>,
    pub rating: Option<f64>,
    pub url: String,
}

impl From<BusinessRecord> for BusinessSummary {
    fn from(record: BusinessRecord) -> Self {
        Self {
            name: record.name,
            image_url: record.image_url,
            price: record.price,
            rating: record.rating,
            url: record.url,
        }
    }
}

impl From<CreateBusiness> for BusinessSummary {
    fn from(record: CreateBusiness) -> Self {
        Self {
            name: record.name,
            image_url: record.image_url,
            price: record.price,
            rating: record.rating,
            url: record.url,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MovieSummary {
    pub title: String,
    pub overview: Option<String>,
    pub average_votes: f64,
    pub total_votes: i64,
    pub image_url: Option<String>,
    pub popularity: f64,
    pub released_on: Option<String>,
}

impl From<MovieRecord> for MovieSummary {
    fn from(record: MovieRecord) -> Self {
        Self {
            title: record.title,
            overview: record.overview,
            average_votes: record.average_votes,
            total_votes: record.total_votes,
            image_url: record.image_url,
            popularity: record.popularity,
            released_on: record.released_on,
        }
    }
}

impl From<CreateMovie> for MovieSummary {
    fn from(record: CreateMovie) -> Self {
        Self {
            title: record.title,
            overview: record.overview,
            average_votes: record.average_votes,
            total_votes: record.total_votes,
            image_url: record.image_url,
            popularity: record.popularity,
            released_on: record.released_on,
        }
    }
}

// Route handlers
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn get_location(
    State(state): State<AppState>,
    Query(params): Query<DataParam>,
) -> Result<Json<LocationResponse>, ApiError> {
    let location = state.resolver.resolve(&params.data).await?;

    Ok(Json(LocationResponse::from(location)))
}

pub async fn get_weather(
    State(state): State<AppState>,
    Query(params): Query<DataParam>,
) -> Result<Json<Vec<ForecastDay>>, ApiError> {
    let query: WeatherQuery = serde_json::from_str(&params.data)?;

    match state.cache.lookup::<WeatherRecord>(query.id).await? {
        CacheState::Fresh(records) => {
            Ok(Json(records.into_iter().map(ForecastDay::from).collect()))
        }
        // Stale rows are dropped together with the persist of the fresh
        // batch; a failed fetch leaves them untouched.
        CacheState::Stale(_) | CacheState::Miss => {
            let batch = state
                .forecast
                .daily_forecast(query.latitude, query.longitude)
                .await?;
            state.cache.replace(query.id, &batch).await?;

            Ok(Json(batch.into_iter().map(ForecastDay::from).collect()))
        }
    }
}

pub async fn get_yelp(
    State(state): State<AppState>,
    Query(params): Query<DataParam>,
) -> Result<Json<Vec<BusinessSummary>>, ApiError> {
    let query: SearchQuery = serde_json::from_str(&params.data)?;

    match state.cache.lookup::<BusinessRecord>(query.id).await? {
        CacheState::Fresh(records) => Ok(Json(
            records.into_iter().map(BusinessSummary::from).collect(),
        )),
        CacheState::Stale(_) | CacheState::Miss => {
            let batch = state.businesses.search(&query.search_query).await?;
            state.cache.replace(query.id, &batch).await?;

            Ok(Json(batch.into_iter().map(BusinessSummary::from).collect()))
        }
    }
}

pub async fn get_movies(
    State(state): State<AppState>,
    Query(params): Query<DataParam>,
) -> Result<Json<Vec<MovieSummary>>, ApiError> {
    let query: SearchQuery = serde_json::from_str(&params.data)?;

    match state.cache.lookup::<MovieRecord>(query.id).await? {
        CacheState::Fresh(records) => {
            Ok(Json(records.into_iter().map(MovieSummary::from).collect()))
        }
        CacheState::Stale(_) | CacheState::Miss => {
            let batch = state.movies.search(&query.search_query).await?;
            state.cache.replace(query.id, &batch).await?;

            Ok(Json(batch.into_iter().map(MovieSummary::from).collect()))
        }
    }
}

// Create the router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/location", get(get_location))
        .route("/weather", get(get_weather))
        .route("/yelp", get(get_yelp))
        .route("/movies", get(get_movies))
        .with_state(state)
}
