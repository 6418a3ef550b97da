//! Multi-resolution statistics for the dashboard.
//!
//! For every tracked metric the engine produces three rollups from the last 30 days of
//! readings:
//!
//! - `daily`: hourly buckets over the last 24 hours
//! - `weekly`: daily buckets over the last 7 days
//! - `monthly`: daily buckets over the last 30 days
//!
//! [`aggregate`] is pure. [`collect_statistics`] does the store I/O first (one concurrent
//! fetch per metric) and then aggregates. "Now" is supplied by the caller so both metrics
//! share identical window boundaries.

pub mod buckets;
pub mod rollup;

use chrono::{DateTime, Duration, Utc};
use futures::future::try_join_all;
use std::collections::BTreeMap;

use crate::services::readings_store::{Metric, Reading, ReadingsStore, StoreError};
pub use buckets::Resolution;
pub use rollup::{RollupPoint, RollupSet, Window};

pub const LOOKBACK_DAYS: i64 = 30;

pub type StatisticsResult = BTreeMap<Metric, RollupSet>;

/// Oldest timestamp the store is asked for.
pub fn lookback_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(LOOKBACK_DAYS)
}

/// Rolls up each metric's series independently. A metric listed twice keeps its last series.
pub fn aggregate<I>(now: DateTime<Utc>, series: I) -> StatisticsResult
where
    I: IntoIterator<Item = (Metric, Vec<Reading>)>,
{
    series
        .into_iter()
        .map(|(metric, readings)| (metric, RollupSet::from_readings(now, &readings)))
        .collect()
}

/// Fetches every metric concurrently and aggregates. Any failed fetch fails the whole call.
pub async fn collect_statistics<S>(
    store: &S,
    metrics: &[Metric],
    now: DateTime<Utc>,
) -> Result<StatisticsResult, StoreError>
where
    S: ReadingsStore,
{
    let since = lookback_start(now);
    let fetches = metrics.iter().map(|&metric| async move {
        let readings = store.fetch_since(metric, since).await?;
        tracing::debug!(%metric, readings = readings.len(), "fetched readings for statistics");
        Ok::<_, StoreError>((metric, readings))
    });
    let series = try_join_all(fetches).await?;
    Ok(aggregate(now, series))
}
