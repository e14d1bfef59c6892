use serde::{Deserialize, Serialize};
use std::env;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub port: u16,
    pub geocoding_api_key: String,
    pub geocoding_base_url: String,
    pub weather_api_key: String,
    pub weather_base_url: String,
    pub yelp_api_key: String,
    pub yelp_base_url: String,
    pub movie_db_api_key: String,
    pub movie_db_base_url: String,
    pub movie_image_base_url: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Config {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a number"))?,
            geocoding_api_key: env::var("GOOGLE_API_KEY")
                .map_err(|_| anyhow::anyhow!("GOOGLE_API_KEY not set"))?,
            geocoding_base_url: env::var("GEOCODING_BASE_URL")
                .unwrap_or_else(|_| "https://maps.googleapis.com".to_string()),
            weather_api_key: env::var("DARK_SKY_API")
                .map_err(|_| anyhow::anyhow!("DARK_SKY_API not set"))?,
            weather_base_url: env::var("WEATHER_BASE_URL")
                .unwrap_or_else(|_| "https://api.darksky.net".to_string()),
            yelp_api_key: env::var("YELP_API_KEY")
                .map_err(|_| anyhow::anyhow!("YELP_API_KEY not set"))?,
            yelp_base_url: env::var("YELP_BASE_URL")
                .unwrap_or_else(|_| "https://api.yelp.com".to_string()),
            movie_db_api_key: env::var("THE_MOVIE_DB_API")
                .map_err(|_| anyhow::anyhow!("THE_MOVIE_DB_API not set"))?,
            movie_db_base_url: env::var("MOVIE_DB_BASE_URL")
                .unwrap_or_else(|_| "https://api.themoviedb.org".to_string()),
            movie_image_base_url: env::var("MOVIE_IMAGE_BASE_URL")
                .unwrap_or_else(|_| "https://image.tmdb.org/t/p/w500".to_string()),
        })
    }
}
