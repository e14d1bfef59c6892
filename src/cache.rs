use chrono::{DateTime, Duration, Utc};
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::Sqlite;
use std::sync::Arc;

use crate::database::{Database, DatabaseError};

pub type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// The resource kinds the store caches, each with its own table and
/// time-to-live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Weather,
    Business,
    Movie,
}

impl ResourceKind {
    pub const fn table(self) -> &'static str {
        match self {
            ResourceKind::Weather => "weathers",
            ResourceKind::Business => "businesses",
            ResourceKind::Movie => "movies",
        }
    }

    pub const fn ttl_minutes(self) -> i64 {
        match self {
            ResourceKind::Weather => 30,
            ResourceKind::Business => 1440,
            ResourceKind::Movie => 10_080,
        }
    }
}

/// Outcome of a cache lookup for one `(kind, location)` key.
#[derive(Debug)]
pub enum CacheState<T> {
    Fresh(Vec<T>),
    Stale(Vec<T>),
    Miss,
}

/// A stored row of some cached kind. Rows of a batch share their
/// `created_at`, so the first row's stamp stands for the whole batch.
pub trait CachedRecord: for<'r> sqlx::FromRow<'r, SqliteRow> + Send + Unpin {
    const KIND: ResourceKind;

    fn created_at(&self) -> DateTime<Utc>;
}

/// A normalized record ready to be persisted for some cached kind.
pub trait CreateRecord: Send + Sync {
    const KIND: ResourceKind;
    const INSERT_SQL: &'static str;

    fn bind_fields<'q>(&self, query: SqliteQuery<'q>) -> SqliteQuery<'q>;
}

/// Freshness-gated view over the relational store: stored batches are
/// served while they are younger than their kind's TTL and refreshed
/// otherwise.
pub struct FreshnessCache {
    database: Arc<Database>,
}

impl FreshnessCache {
    pub fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    pub async fn lookup<T: CachedRecord>(
        &self,
        location_id: i64,
    ) -> Result<CacheState<T>, DatabaseError> {
        let records = self.database.records_for_location::<T>(location_id).await?;

        Ok(Self::gate(records, Utc::now()))
    }

    pub async fn invalidate(
        &self,
        kind: ResourceKind,
        location_id: i64,
    ) -> Result<(), DatabaseError> {
        self.database.delete_records(kind, location_id).await
    }

    /// Replaces the stored batch for the key with a freshly fetched one.
    /// The invalidate and the persist run in one transaction.
    pub async fn replace<N: CreateRecord>(
        &self,
        location_id: i64,
        batch: &[N],
    ) -> Result<(), DatabaseError> {
        self.database.replace_records(location_id, batch).await
    }

    // Age boundary is inclusive-fresh: a batch exactly TTL minutes old is
    // still served.
    fn gate<T: CachedRecord>(records: Vec<T>, now: DateTime<Utc>) -> CacheState<T> {
        let first = match records.first() {
            Some(first) => first,
            None => return CacheState::Miss,
        };

        let age = now - first.created_at();
        if age <= Duration::minutes(T::KIND.ttl_minutes()) {
            CacheState::Fresh(records)
        } else {
            CacheState::Stale(records)
        }
    }
}
