//! Readings store: the persistence collaborator behind the statistics engine.
//!
//! The engine only needs [`ReadingsStore::fetch_since`]. The passthrough routes
//! (insert/list/delete) use the inherent methods on [`PgReadingsStore`].

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::fmt;
use std::future::Future;

/// A tracked sensor series. The external names are part of the dashboard contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Metric {
    Celcius,
    Humidity,
}

impl Metric {
    pub const ALL: [Metric; 2] = [Metric::Celcius, Metric::Humidity];

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Celcius => "celcius",
            Metric::Humidity => "humidity",
        }
    }

    fn table(self) -> &'static str {
        match self {
            Metric::Celcius => "celcius",
            Metric::Humidity => "humidity",
        }
    }

    fn value_column(self) -> &'static str {
        match self {
            Metric::Celcius => "degrees",
            Metric::Humidity => "percent",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

impl Reading {
    pub fn new(value: f64, timestamp: DateTime<Utc>) -> Self {
        Self { value, timestamp }
    }
}

/// A stored row as listed by the passthrough routes.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredReading {
    pub id: i64,
    pub value: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to fetch {metric} readings: {source}")]
    Fetch {
        metric: Metric,
        #[source]
        source: sqlx::Error,
    },
}

pub trait ReadingsStore: Send + Sync {
    /// Readings of `metric` with `timestamp >= since`, ascending by timestamp.
    fn fetch_since(
        &self,
        metric: Metric,
        since: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<Reading>, StoreError>> + Send;
}

#[derive(Clone)]
pub struct PgReadingsStore {
    db: PgPool,
}

#[derive(sqlx::FromRow)]
struct ReadingRow {
    value: f64,
    created_at: DateTime<Utc>,
}

impl PgReadingsStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn insert(&self, metric: Metric, value: i32) -> Result<(), sqlx::Error> {
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ($1)",
            metric.table(),
            metric.value_column()
        );
        sqlx::query(&sql).bind(value).execute(&self.db).await?;
        Ok(())
    }

    /// All rows for `metric`, newest first.
    pub async fn list(&self, metric: Metric) -> Result<Vec<StoredReading>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT id, {} AS value, created_at
            FROM {}
            ORDER BY created_at DESC, id DESC
            "#,
            metric.value_column(),
            metric.table()
        );
        sqlx::query_as(&sql).fetch_all(&self.db).await
    }

    /// Returns the number of deleted rows.
    pub async fn delete(&self, metric: Metric, id: i64) -> Result<u64, sqlx::Error> {
        let sql = format!("DELETE FROM {} WHERE id = $1", metric.table());
        let result = sqlx::query(&sql).bind(id).execute(&self.db).await?;
        Ok(result.rows_affected())
    }
}

impl ReadingsStore for PgReadingsStore {
    async fn fetch_since(
        &self,
        metric: Metric,
        since: DateTime<Utc>,
    ) -> Result<Vec<Reading>, StoreError> {
        let sql = format!(
            r#"
            SELECT {}::double precision AS value, created_at
            FROM {}
            WHERE created_at >= $1
            ORDER BY created_at ASC, id ASC
            "#,
            metric.value_column(),
            metric.table()
        );
        let rows: Vec<ReadingRow> = sqlx::query_as(&sql)
            .bind(since)
            .fetch_all(&self.db)
            .await
            .map_err(|source| {
                tracing::error!(%metric, error = %source, "readings fetch failed");
                StoreError::Fetch { metric, source }
            })?;

        Ok(rows
            .into_iter()
            .map(|row| Reading::new(row.value, row.created_at))
            .collect())
    }
}
