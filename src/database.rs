use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;

use crate::cache::{CachedRecord, CreateRecord, ResourceKind, SqliteQuery};

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database operation failed: {0}")]
    QueryFailed(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Location {
    pub id: i64,
    pub search_query: String,
    pub formatted_query: String,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateLocation {
    pub search_query: String,
    pub formatted_query: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WeatherRecord {
    pub id: i64,
    pub location_id: i64,
    pub forecast: String,
    pub time: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateWeather {
    pub forecast: String,
    pub time: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BusinessRecord {
    pub id: i64,
    pub location_id: i64,
    pub name: String,
    pub image_url: Option<String>,
    pub price: Option<String>,
    pub rating: Option<f64>,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateBusiness {
    pub name: String,
    pub image_url: Option<String>,
    pub price: Option<String>,
    pub rating: Option<f64>,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MovieRecord {
    pub id: i64,
    pub location_id: i64,
    pub title: String,
    pub overview: Option<String>,
    pub average_votes: f64,
    pub total_votes: i64,
    pub image_url: Option<String>,
    pub popularity: f64,
    pub released_on: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateMovie {
    pub title: String,
    pub overview: Option<String>,
    pub average_votes: f64,
    pub total_votes: i64,
    pub image_url: Option<String>,
    pub popularity: f64,
    pub released_on: Option<String>,
}

impl CachedRecord for WeatherRecord {
    const KIND: ResourceKind = ResourceKind::Weather;

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl CreateRecord for CreateWeather {
    const KIND: ResourceKind = ResourceKind::Weather;
    const INSERT_SQL: &'static str =
        "INSERT INTO weathers (forecast, time, location_id, created_at) VALUES ($1, $2, $3, $4)";

    fn bind_fields<'q>(&self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query.bind(self.forecast.clone()).bind(self.time)
    }
}

impl CachedRecord for BusinessRecord {
    const KIND: ResourceKind = ResourceKind::Business;

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl CreateRecord for CreateBusiness {
    const KIND: ResourceKind = ResourceKind::Business;
    const INSERT_SQL: &'static str = "INSERT INTO businesses (name, image_url, price, rating, url, location_id, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7)";

    fn bind_fields<'q>(&self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(self.name.clone())
            .bind(self.image_url.clone())
            .bind(self.price.clone())
            .bind(self.rating)
            .bind(self.url.clone())
    }
}

impl CachedRecord for MovieRecord {
    const KIND: ResourceKind = ResourceKind::Movie;

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl CreateRecord for CreateMovie {
    const KIND: ResourceKind = ResourceKind::Movie;
    const INSERT_SQL: &'static str = "INSERT INTO movies (title, overview, average_votes, total_votes, image_url, popularity, released_on, location_id, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)";

    fn bind_fields<'q>(&self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(self.title.clone())
            .bind(self.overview.clone())
            .bind(self.average_votes)
            .bind(self.total_votes)
            .bind(self.image_url.clone())
            .bind(self.popularity)
            .bind(self.released_on.clone())
    }
}

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn init_tables(&self) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS locations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                search_query TEXT NOT NULL UNIQUE,
                formatted_query TEXT NOT NULL,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS weathers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                location_id INTEGER NOT NULL REFERENCES locations(id),
                forecast TEXT NOT NULL,
                time TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS businesses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                location_id INTEGER NOT NULL REFERENCES locations(id),
                name TEXT NOT NULL,
                image_url TEXT,
                price TEXT,
                rating REAL,
                url TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS movies (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                location_id INTEGER NOT NULL REFERENCES locations(id),
                title TEXT NOT NULL,
                overview TEXT,
                average_votes REAL NOT NULL,
                total_votes INTEGER NOT NULL,
                image_url TEXT,
                popularity REAL NOT NULL,
                released_on TEXT,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_weathers_location_id ON weathers(location_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_businesses_location_id ON businesses(location_id)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_movies_location_id ON movies(location_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn find_location(
        &self,
        search_query: &str,
    ) -> Result<Option<Location>, DatabaseError> {
        let location =
            sqlx::query_as::<_, Location>("SELECT * FROM locations WHERE search_query = $1")
                .bind(search_query)
                .fetch_optional(&self.pool)
                .await?;

        Ok(location)
    }

    // Two concurrent writers may both attempt the insert; the unique index
    // makes the loser a no-op and the re-read returns the winning row.
    pub async fn insert_location(
        &self,
        location: CreateLocation,
    ) -> Result<Location, DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO locations (search_query, formatted_query, latitude, longitude, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT(search_query) DO NOTHING
            "#,
        )
        .bind(location.search_query.clone())
        .bind(location.formatted_query)
        .bind(location.latitude)
        .bind(location.longitude)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let row = sqlx::query_as::<_, Location>("SELECT * FROM locations WHERE search_query = $1")
            .bind(location.search_query)
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    pub async fn records_for_location<T: CachedRecord>(
        &self,
        location_id: i64,
    ) -> Result<Vec<T>, DatabaseError> {
        let sql = format!(
            "SELECT * FROM {} WHERE location_id = $1 ORDER BY id",
            T::KIND.table()
        );
        let records = sqlx::query_as::<_, T>(&sql)
            .bind(location_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    pub async fn delete_records(
        &self,
        kind: ResourceKind,
        location_id: i64,
    ) -> Result<(), DatabaseError> {
        let sql = format!("DELETE FROM {} WHERE location_id = $1", kind.table());
        sqlx::query(&sql).bind(location_id).execute(&self.pool).await?;

        Ok(())
    }

    // The delete and the batched insert commit together, so readers see
    // either the previous batch or the new one, never a mix or a gap.
    pub async fn replace_records<N: CreateRecord>(
        &self,
        location_id: i64,
        batch: &[N],
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let delete_sql = format!("DELETE FROM {} WHERE location_id = $1", N::KIND.table());
        sqlx::query(&delete_sql)
            .bind(location_id)
            .execute(&mut *tx)
            .await?;

        // One fetch time for the whole batch; staleness is judged from the
        // first row on the way back out.
        let fetched_at = Utc::now();
        for record in batch {
            record
                .bind_fields(sqlx::query(N::INSERT_SQL))
                .bind(location_id)
                .bind(fetched_at)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_database() -> (Database, SqlitePool) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let database = Database::new(pool.clone());
        database.init_tables().await.unwrap();
        (database, pool)
    }

    fn sample_location() -> CreateLocation {
        CreateLocation {
            search_query: "seattle".to_string(),
            formatted_query: "Seattle, WA, USA".to_string(),
            latitude: 47.6062,
            longitude: -122.3321,
        }
    }

    #[tokio::test]
    async fn insert_location_is_idempotent() {
        let (database, pool) = test_database().await;

        let first = database.insert_location(sample_location()).await.unwrap();
        let second = database.insert_location(sample_location()).await.unwrap();

        assert_eq!(first.id, second.id);
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM locations")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn replace_records_swaps_whole_batch() {
        let (database, _pool) = test_database().await;
        let location = database.insert_location(sample_location()).await.unwrap();

        let first_batch = vec![
            CreateWeather {
                forecast: "Clear throughout the day.".to_string(),
                time: NaiveDate::from_ymd_opt(2025, 8, 6).unwrap(),
            },
            CreateWeather {
                forecast: "Light rain in the morning.".to_string(),
                time: NaiveDate::from_ymd_opt(2025, 8, 7).unwrap(),
            },
        ];
        database
            .replace_records(location.id, &first_batch)
            .await
            .unwrap();

        let second_batch = vec![
            CreateWeather {
                forecast: "Overcast.".to_string(),
                time: NaiveDate::from_ymd_opt(2025, 8, 6).unwrap(),
            },
            CreateWeather {
                forecast: "Windy in the evening.".to_string(),
                time: NaiveDate::from_ymd_opt(2025, 8, 7).unwrap(),
            },
            CreateWeather {
                forecast: "Partly cloudy.".to_string(),
                time: NaiveDate::from_ymd_opt(2025, 8, 8).unwrap(),
            },
        ];
        database
            .replace_records(location.id, &second_batch)
            .await
            .unwrap();

        let records = database
            .records_for_location::<WeatherRecord>(location.id)
            .await
            .unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].forecast, "Overcast.");
        // One fetch time stamped across the batch
        assert!(records
            .iter()
            .all(|record| record.created_at == records[0].created_at));
    }
}
