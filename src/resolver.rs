use std::sync::Arc;
use thiserror::Error;

use crate::database::{CreateLocation, Database, DatabaseError, Location};
use crate::providers::{GeocodeProvider, ProviderError};

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("geocoding failed: {0}")]
    Geocode(#[from] ProviderError),
    #[error("location store failed: {0}")]
    Store(#[from] DatabaseError),
}

/// Maps a free-text query to its canonical location record, geocoding and
/// persisting the query on first sight. Locations are never updated or
/// deleted afterwards.
pub struct LocationResolver {
    database: Arc<Database>,
    geocoder: Arc<dyn GeocodeProvider>,
}

impl LocationResolver {
    pub fn new(database: Arc<Database>, geocoder: Arc<dyn GeocodeProvider>) -> Self {
        Self { database, geocoder }
    }

    pub async fn resolve(&self, query: &str) -> Result<Location, ResolveError> {
        if let Some(location) = self.database.find_location(query).await? {
            return Ok(location);
        }

        let address = self.geocoder.geocode(query).await?;
        let location = self
            .database
            .insert_location(CreateLocation {
                search_query: query.to_string(),
                formatted_query: address.formatted_address,
                latitude: address.latitude,
                longitude: address.longitude,
            })
            .await?;

        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::mock::MockGeocoder;
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;
    use std::sync::atomic::Ordering;

    async fn test_resolver() -> (LocationResolver, SqlitePool, Arc<MockGeocoder>) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let database = Arc::new(Database::new(pool.clone()));
        database.init_tables().await.unwrap();

        let geocoder = Arc::new(MockGeocoder::new());
        let resolver = LocationResolver::new(database, geocoder.clone());
        (resolver, pool, geocoder)
    }

    #[tokio::test]
    async fn concurrent_resolution_yields_one_row() {
        let (resolver, pool, _geocoder) = test_resolver().await;

        let (first, second) = tokio::join!(resolver.resolve("seattle"), resolver.resolve("seattle"));
        let first = first.unwrap();
        let second = second.unwrap();

        assert_eq!(first.id, second.id);
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM locations")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn known_query_skips_the_geocoder() {
        let (resolver, _pool, geocoder) = test_resolver().await;

        let first = resolver.resolve("seattle").await.unwrap();
        let second = resolver.resolve("seattle").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.formatted_query, "seattle, USA");
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);
    }
}
