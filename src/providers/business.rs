use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::{fetch_json, BusinessProvider, ProviderError};
use crate::config::Config;
use crate::database::CreateBusiness;

#[derive(Debug, Deserialize)]
struct BusinessSearchResponse {
    businesses: Vec<BusinessEntry>,
}

#[derive(Debug, Deserialize)]
struct BusinessEntry {
    name: String,
    image_url: Option<String>,
    price: Option<String>,
    rating: Option<f64>,
    url: String,
}

pub struct BusinessSearchClient {
    client: Client,
    config: Config,
}

impl BusinessSearchClient {
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
impl BusinessProvider for BusinessSearchClient {
    async fn search(&self, search_text: &str) -> Result<Vec<CreateBusiness>, ProviderError> {
        let url = format!("{}/v3/businesses/search", self.config.yelp_base_url);
        let request = self
            .client
            .get(&url)
            .bearer_auth(&self.config.yelp_api_key)
            .query(&[("location", search_text)]);

        let json = fetch_json(request).await?;
        let response: BusinessSearchResponse = serde_json::from_value(json)?;

        Ok(normalize(response))
    }
}

fn normalize(response: BusinessSearchResponse) -> Vec<CreateBusiness> {
    response
        .businesses
        .into_iter()
        .map(|business| CreateBusiness {
            name: business.name,
            image_url: business.image_url,
            price: business.price,
            rating: business.rating,
            url: business.url,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_in_provider_order() {
        let json = serde_json::json!({
            "businesses": [
                {
                    "name": "Pike Place Chowder",
                    "image_url": "https://example.com/chowder.jpg",
                    "price": "$$",
                    "rating": 4.5,
                    "url": "https://yelp.example.com/pike-place-chowder"
                },
                {
                    "name": "The Pink Door",
                    "url": "https://yelp.example.com/the-pink-door"
                }
            ]
        });

        let response: BusinessSearchResponse = serde_json::from_value(json).unwrap();
        let records = normalize(response);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Pike Place Chowder");
        assert_eq!(records[0].price.as_deref(), Some("$$"));
        assert_eq!(records[1].name, "The Pink Door");
        assert!(records[1].image_url.is_none());
        assert!(records[1].rating.is_none());
    }
}
