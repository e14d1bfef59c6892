use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::{fetch_json, MovieProvider, ProviderError};
use crate::config::Config;
use crate::database::CreateMovie;

#[derive(Debug, Deserialize)]
struct MovieSearchResponse {
    results: Vec<MovieEntry>,
}

#[derive(Debug, Deserialize)]
struct MovieEntry {
    title: String,
    overview: Option<String>,
    vote_average: f64,
    vote_count: i64,
    poster_path: Option<String>,
    popularity: f64,
    release_date: Option<String>,
}

pub struct MovieSearchClient {
    client: Client,
    config: Config,
}

impl MovieSearchClient {
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
impl MovieProvider for MovieSearchClient {
    async fn search(&self, search_text: &str) -> Result<Vec<CreateMovie>, ProviderError> {
        let url = format!("{}/3/search/movie", self.config.movie_db_base_url);
        let request = self.client.get(&url).query(&[
            ("api_key", self.config.movie_db_api_key.as_str()),
            ("query", search_text),
        ]);

        let json = fetch_json(request).await?;
        let response: MovieSearchResponse = serde_json::from_value(json)?;

        Ok(normalize(response, &self.config.movie_image_base_url))
    }
}

fn normalize(response: MovieSearchResponse, image_base_url: &str) -> Vec<CreateMovie> {
    response
        .results
        .into_iter()
        .map(|movie| CreateMovie {
            title: movie.title,
            overview: movie.overview,
            average_votes: movie.vote_average,
            total_votes: movie.vote_count,
            image_url: movie
                .poster_path
                .map(|path| format!("{}{}", image_base_url, path)),
            popularity: movie.popularity,
            // The provider sends an empty string when the date is unknown
            released_on: movie.release_date.filter(|date| !date.is_empty()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_poster_paths_against_image_host() {
        let json = serde_json::json!({
            "results": [
                {
                    "title": "Sleepless in Seattle",
                    "overview": "A widower's son calls a radio show.",
                    "vote_average": 6.7,
                    "vote_count": 1500,
                    "poster_path": "/sleepless.jpg",
                    "popularity": 18.4,
                    "release_date": "1993-06-25"
                },
                {
                    "title": "Untitled Project",
                    "overview": null,
                    "vote_average": 0.0,
                    "vote_count": 0,
                    "poster_path": null,
                    "popularity": 0.5,
                    "release_date": ""
                }
            ]
        });

        let response: MovieSearchResponse = serde_json::from_value(json).unwrap();
        let records = normalize(response, "https://image.tmdb.org/t/p/w500");

        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].image_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/sleepless.jpg")
        );
        assert_eq!(records[0].released_on.as_deref(), Some("1993-06-25"));
        assert!(records[1].image_url.is_none());
        assert!(records[1].released_on.is_none());
    }
}
