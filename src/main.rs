use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cache;
mod config;
mod database;
mod providers;
mod resolver;
mod routes;

use cache::FreshnessCache;
use config::Config;
use database::Database;
use providers::business::BusinessSearchClient;
use providers::forecast::ForecastClient;
use providers::geocode::GeocodingClient;
use providers::movie::MovieSearchClient;
use resolver::LocationResolver;
use routes::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "city_explorer_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite:./city_explorer.db".to_string());
    let pool = sqlx::SqlitePool::connect(&database_url).await?;
    let database = Arc::new(Database::new(pool));
    database.init_tables().await?;

    let geocoder = Arc::new(GeocodingClient::new(config.clone()));
    let resolver = Arc::new(LocationResolver::new(database.clone(), geocoder));
    let cache = Arc::new(FreshnessCache::new(database.clone()));

    let state = AppState {
        resolver,
        cache,
        forecast: Arc::new(ForecastClient::new(config.clone())),
        businesses: Arc::new(BusinessSearchClient::new(config.clone())),
        movies: Arc::new(MovieSearchClient::new(config.clone())),
    };

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server starting on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
