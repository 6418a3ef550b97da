use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

use super::buckets::Resolution;
use crate::services::readings_store::Reading;

/// Trailing window measured back from "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// Last 24 hours, hourly buckets.
    Day,
    /// Last 7 days, daily buckets.
    Week,
    /// Last 30 days, daily buckets. The store fetch bounds this window.
    Month,
}

impl Window {
    pub fn resolution(self) -> Resolution {
        match self {
            Window::Day => Resolution::Hourly,
            Window::Week | Window::Month => Resolution::Daily,
        }
    }

    /// Inclusive lower bound, or `None` when every reading handed in qualifies.
    pub fn lower_bound(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Window::Day => Some(now - Duration::hours(24)),
            Window::Week => Some(now - Duration::days(7)),
            Window::Month => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Accumulator {
    sum: f64,
    count: u64,
}

impl Accumulator {
    pub fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    // Buckets only exist once a reading arrived, so count >= 1.
    pub fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RollupPoint {
    pub time: DateTime<Utc>,
    pub value: f64,
    pub samples: u64,
}

/// Folds readings for one window into averaged buckets, emitted in ascending key order.
#[derive(Debug)]
pub struct RollupBuilder {
    resolution: Resolution,
    lower_bound: Option<DateTime<Utc>>,
    buckets: BTreeMap<DateTime<Utc>, Accumulator>,
}

impl RollupBuilder {
    pub fn new(window: Window, now: DateTime<Utc>) -> Self {
        Self {
            resolution: window.resolution(),
            lower_bound: window.lower_bound(now),
            buckets: BTreeMap::new(),
        }
    }

    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        self.lower_bound.map_or(true, |bound| timestamp >= bound)
    }

    /// Returns whether the reading fell inside the window.
    pub fn observe(&mut self, reading: &Reading) -> bool {
        if !self.contains(reading.timestamp) {
            return false;
        }
        let key = self.resolution.bucket_start(&reading.timestamp);
        self.buckets.entry(key).or_default().add(reading.value);
        true
    }

    pub fn finish(self) -> Vec<RollupPoint> {
        self.buckets
            .into_iter()
            .map(|(time, acc)| RollupPoint {
                time,
                value: acc.mean(),
                samples: acc.count(),
            })
            .collect()
    }
}

/// The three rollups for one metric.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RollupSet {
    /// Hourly buckets over the last 24 hours.
    pub daily: Vec<RollupPoint>,
    /// Daily buckets over the last 7 days.
    pub weekly: Vec<RollupPoint>,
    /// Daily buckets over the last 30 days.
    pub monthly: Vec<RollupPoint>,
}

impl RollupSet {
    pub fn from_readings(now: DateTime<Utc>, readings: &[Reading]) -> Self {
        let mut daily = RollupBuilder::new(Window::Day, now);
        let mut weekly = RollupBuilder::new(Window::Week, now);
        let mut monthly = RollupBuilder::new(Window::Month, now);

        for reading in readings {
            monthly.observe(reading);
            weekly.observe(reading);
            daily.observe(reading);
        }

        Self {
            daily: daily.finish(),
            weekly: weekly.finish(),
            monthly: monthly.finish(),
        }
    }
}
